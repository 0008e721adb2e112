// Error taxonomy for catalog, favorites, comments and timetable operations

use crate::models::ClassSummary;
use serde_json::{Value, json};
use thiserror::Error;

/// Which kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Class,
    Favorite,
    Comment,
    Timetable,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Class => write!(f, "class"),
            Entity::Favorite => write!(f, "favorite"),
            Entity::Comment => write!(f, "comment"),
            Entity::Timetable => write!(f, "timetable"),
        }
    }
}

/// Coarse classification used by the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Storage,
}

#[derive(Error, Debug)]
pub enum CourseError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("already favorited")]
    AlreadyFavorited,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("time conflict")]
    TimeConflict { conflict_with: ClassSummary },

    #[error(transparent)]
    Storage(#[from] eyre::Report),
}

pub type CourseResult<T> = std::result::Result<T, CourseError>;

impl CourseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourseError::NotFound(_) => ErrorKind::NotFound,
            CourseError::AlreadyFavorited | CourseError::AlreadyRegistered | CourseError::TimeConflict { .. } => {
                ErrorKind::Conflict
            }
            CourseError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable short reason, safe to show to users. Storage details are not exposed.
    pub fn reason(&self) -> String {
        match self {
            CourseError::Storage(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP-style status for the boundary layer
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 400,
            ErrorKind::Storage => 500,
        }
    }

    /// Response body: `{"error": reason}`, plus the colliding class for time conflicts
    pub fn to_payload(&self) -> Value {
        match self {
            CourseError::TimeConflict { conflict_with } => json!({
                "error": self.reason(),
                "conflict_with": conflict_with,
            }),
            _ => json!({ "error": self.reason() }),
        }
    }
}
