// Data models for the course store

use crate::record::{IndexValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A class from the catalog. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: u64,
    pub name: String,
    pub day: String,
    pub period: i64,
    pub term: i64,
}

impl ClassRecord {
    /// The weekly slot a class occupies
    pub fn slot(&self) -> (&str, i64) {
        (&self.day, self.period)
    }

    pub fn summary(&self) -> ClassSummary {
        ClassSummary {
            id: self.id,
            name: self.name.clone(),
            day: self.day.clone(),
            period: self.period,
        }
    }
}

impl Record for ClassRecord {
    fn id(&self) -> u64 {
        self.id
    }

    fn collection_name() -> &'static str {
        "classes"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), IndexValue::String(self.name.clone()));
        fields.insert("day".to_string(), IndexValue::String(self.day.clone()));
        fields.insert("period".to_string(), IndexValue::Int(self.period));
        fields.insert("term".to_string(), IndexValue::Int(self.term));
        fields
    }
}

/// The part of a class reported back when it blocks a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub id: u64,
    pub name: String,
    pub day: String,
    pub period: i64,
}

/// A user's favorite class. At most one per (user_id, class_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: u64,
    pub user_id: u64,
    pub class_id: u64,
}

impl Record for Favorite {
    fn id(&self) -> u64 {
        self.id
    }

    fn collection_name() -> &'static str {
        "favorites"
    }
}

/// A comment posted on a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub user_id: u64,
    pub class_id: u64,
    pub content: String,
}

impl Record for Comment {
    fn id(&self) -> u64 {
        self.id
    }

    fn collection_name() -> &'static str {
        "comments"
    }
}

/// A class placed on a user's weekly timetable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: u64,
    pub user_id: u64,
    pub class_id: u64,
}

impl Record for TimetableEntry {
    fn id(&self) -> u64 {
        self.id
    }

    fn collection_name() -> &'static str {
        "timetable"
    }
}

/// A favorite joined with its class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteView {
    pub favorite_id: u64,
    pub class: ClassRecord,
}

/// A timetable entry joined with its class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableView {
    pub timetable_id: u64,
    pub class: ClassRecord,
}
