// Read-only class catalog with filter search

use crate::document;
use crate::error::{CourseError, CourseResult, Entity};
use crate::filter::{Filter, matches_all};
use crate::models::ClassRecord;
use crate::record::IndexValue;
use eyre::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Optional, independently applied search criteria. All present criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClassQuery {
    /// Substring of the class name
    pub keyword: Option<String>,
    pub day: Option<String>,
    pub period: Option<i64>,
    pub term: Option<i64>,
}

impl ClassQuery {
    /// Translate the query into record filters. Empty strings count as absent.
    pub fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            filters.push(Filter::contains("name", keyword));
        }
        if let Some(day) = self.day.as_deref().filter(|d| !d.is_empty()) {
            filters.push(Filter::eq("day", IndexValue::String(day.to_string())));
        }
        if let Some(period) = self.period {
            filters.push(Filter::eq("period", IndexValue::Int(period)));
        }
        if let Some(term) = self.term {
            filters.push(Filter::eq("term", IndexValue::Int(term)));
        }

        filters
    }
}

/// Class metadata lookup. Never mutated after loading.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    classes: Vec<ClassRecord>,
}

impl Catalog {
    /// Load a catalog from a bare-array JSON document
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_classes(document::read_array(path)?))
    }

    pub fn from_classes(classes: Vec<ClassRecord>) -> Self {
        Self { classes }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes matching every criterion in `query`, in catalog order
    pub fn list(&self, query: &ClassQuery) -> Vec<ClassRecord> {
        let filters = query.filters();
        let classes: Vec<ClassRecord> = self
            .classes
            .iter()
            .filter(|c| matches_all(&filters, *c))
            .cloned()
            .collect();

        debug!(filters = filters.len(), matched = classes.len(), "Listed classes");
        classes
    }

    pub fn get_by_id(&self, id: u64) -> Option<&ClassRecord> {
        self.classes.iter().find(|c| c.id == id)
    }

    /// Like `get_by_id`, but absence is a `NotFound(Class)` error
    pub fn require(&self, id: u64) -> CourseResult<&ClassRecord> {
        self.get_by_id(id).ok_or(CourseError::NotFound(Entity::Class))
    }
}
