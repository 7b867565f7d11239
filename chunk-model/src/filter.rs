use serde::{Deserialize, Serialize};

/// Comparison applied by a [`SearchFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    /// Anything the engine does not understand; such filters never match
    #[serde(other)]
    Unknown,
}

/// A caller-supplied search filter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchFilter {
    /// Metadata field the filter applies to
    pub field: String,

    /// Value to compare against
    pub value: String,

    #[serde(default)]
    pub operator: FilterOperator,

    /// Optional weight, forwarded to the semantic provider
    #[serde(default)]
    pub weight: Option<f32>,
}

impl SearchFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
            weight: None,
        }
    }

    /// Shorthand for an equality filter on the `framework` field
    pub fn framework(value: impl Into<String>) -> Self {
        Self::new("framework", value, FilterOperator::Equals)
    }

    /// Whether the filter targets the `framework` field
    pub fn is_framework_filter(&self) -> bool {
        self.field.eq_ignore_ascii_case("framework")
    }

    /// Whether this filter selects the given framework.
    ///
    /// Only positive operators (`Equals`, `Contains`) on the `framework` field
    /// can align; comparisons are case-insensitive.
    pub fn matches_framework(&self, framework: Option<&str>) -> bool {
        let Some(framework) = framework else {
            return false;
        };
        if !self.is_framework_filter() {
            return false;
        }

        let framework = framework.to_lowercase();
        let value = self.value.to_lowercase();
        match self.operator {
            FilterOperator::Equals => framework == value,
            FilterOperator::Contains => framework.contains(&value),
            FilterOperator::NotEquals | FilterOperator::Unknown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_framework_equality() {
        let filter = SearchFilter::framework("React");
        assert!(filter.matches_framework(Some("react")));
        assert!(!filter.matches_framework(Some("vue")));
        assert!(!filter.matches_framework(None));
    }

    #[test]
    fn test_contains_operator() {
        let filter = SearchFilter::new("Framework", "next", FilterOperator::Contains);
        assert!(filter.matches_framework(Some("nextjs")));
    }

    #[test]
    fn test_other_fields_never_align() {
        let filter = SearchFilter::new("category", "react", FilterOperator::Equals);
        assert!(!filter.matches_framework(Some("react")));
    }

    #[test]
    fn test_unknown_operator_is_ignored() {
        let filter: SearchFilter = serde_json::from_str(
            r#"{"field": "framework", "value": "react", "operator": "regex"}"#,
        )
        .unwrap();

        assert_eq!(filter.operator, FilterOperator::Unknown);
        assert!(!filter.matches_framework(Some("react")));
    }
}
