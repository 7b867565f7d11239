use serde::{Deserialize, Serialize};

/// What part of a decomposed query a component describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Names, signatures, file layout; favors exact keyword matching
    Structural,
    /// Intent or behavior described in prose; favors embeddings
    Semantic,
    #[default]
    General,
}

/// One component of a query produced by an external decomposition layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryComponent {
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub kind: ComponentKind,

    /// Extra terms the decomposition layer attached to this component
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl QueryComponent {
    pub fn new(id: impl Into<String>, text: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind,
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Text query searched on behalf of this component
    pub fn derived_query(&self) -> String {
        let mut parts = vec![self.text.trim()];
        parts.extend(
            self.keywords
                .iter()
                .map(String::as_str)
                .map(str::trim)
                .filter(|keyword| !keyword.is_empty()),
        );
        parts.retain(|part| !part.is_empty());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_derived_query_appends_keywords() {
        let component = QueryComponent::new("c1", "user lookup", ComponentKind::Structural)
            .with_keywords(["getUser", " ", "UserService"]);
        assert_eq!(component.derived_query(), "user lookup getUser UserService");
    }

    #[test]
    fn test_derived_query_without_text() {
        let component =
            QueryComponent::new("c2", "  ", ComponentKind::General).with_keywords(["cache"]);
        assert_eq!(component.derived_query(), "cache");
    }

    #[test]
    fn test_kind_defaults_to_general() {
        let component: QueryComponent =
            serde_json::from_str(r#"{"id": "c3", "text": "auth flow"}"#).unwrap();
        assert_eq!(component.kind, ComponentKind::General);
        assert!(component.keywords.is_empty());
    }
}
