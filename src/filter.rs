// Query filtering for generic records

use crate::record::{IndexValue, Record};

/// Filter for querying records
#[derive(Debug, Clone)]
pub struct Filter {
    /// Field name to filter on
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Value to compare against
    pub value: IndexValue,
}

/// Comparison operators for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,       // ==
    Contains, // substring
}

impl Filter {
    pub fn eq(field: &str, value: IndexValue) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Eq,
            value,
        }
    }

    pub fn contains(field: &str, needle: &str) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Contains,
            value: IndexValue::String(needle.to_string()),
        }
    }

    /// Evaluate this filter against a record's indexed fields.
    ///
    /// A record that does not index `field`, or indexes it with a different
    /// value type, never matches.
    pub fn matches<T: Record>(&self, record: &T) -> bool {
        let fields = record.indexed_fields();
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };

        match (self.op, actual, &self.value) {
            (FilterOp::Eq, IndexValue::String(a), IndexValue::String(b)) => a == b,
            (FilterOp::Eq, IndexValue::Int(a), IndexValue::Int(b)) => a == b,
            (FilterOp::Contains, IndexValue::String(haystack), IndexValue::String(needle)) => {
                haystack.contains(needle.as_str())
            }
            _ => false,
        }
    }
}

/// True when every filter matches (an empty filter list matches everything)
pub fn matches_all<T: Record>(filters: &[Filter], record: &T) -> bool {
    filters.iter().all(|f| f.matches(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
        count: i64,
    }

    impl Record for Row {
        fn id(&self) -> u64 {
            self.id
        }

        fn collection_name() -> &'static str {
            "rows"
        }

        fn indexed_fields(&self) -> HashMap<String, IndexValue> {
            let mut fields = HashMap::new();
            fields.insert("name".to_string(), IndexValue::String(self.name.clone()));
            fields.insert("count".to_string(), IndexValue::Int(self.count));
            fields
        }
    }

    fn row() -> Row {
        Row {
            id: 1,
            name: "線形代数学".to_string(),
            count: 3,
        }
    }

    #[test]
    fn test_filter_creation() {
        let filter = Filter::eq("name", IndexValue::String("active".to_string()));

        assert_eq!(filter.field, "name");
        assert_eq!(filter.op, FilterOp::Eq);
    }

    #[test]
    fn test_eq_on_strings_and_ints() {
        assert!(Filter::eq("count", IndexValue::Int(3)).matches(&row()));
        assert!(!Filter::eq("count", IndexValue::Int(4)).matches(&row()));
        assert!(Filter::eq("name", IndexValue::String("線形代数学".to_string())).matches(&row()));
        // Eq is exact, not a prefix or substring match
        assert!(!Filter::eq("name", IndexValue::String("線形".to_string())).matches(&row()));
    }

    #[test]
    fn test_contains_handles_multibyte_text() {
        assert!(Filter::contains("name", "代数").matches(&row()));
        assert!(!Filter::contains("name", "幾何").matches(&row()));
    }

    #[test]
    fn test_type_mismatch_and_unknown_field_never_match() {
        assert!(!Filter::eq("count", IndexValue::String("3".to_string())).matches(&row()));
        assert!(!Filter::eq("missing", IndexValue::Int(3)).matches(&row()));
        assert!(!Filter::contains("count", "3").matches(&row()));
    }

    #[test]
    fn test_matches_all_is_conjunctive() {
        let filters = vec![
            Filter::contains("name", "代数"),
            Filter::eq("count", IndexValue::Int(3)),
        ];
        assert!(matches_all(&filters, &row()));

        let filters = vec![
            Filter::contains("name", "代数"),
            Filter::eq("count", IndexValue::Int(9)),
        ];
        assert!(!matches_all(&filters, &row()));

        assert!(matches_all(&[], &row()));
    }
}
