use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata attached to a chunk by the content-processing pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Kind of code this chunk holds (function, class, component, ...)
    #[serde(default = "default_category")]
    pub category: String,

    /// Framework the chunk belongs to, if one was detected
    #[serde(default)]
    pub framework: Option<String>,

    /// Importance weight in [0.0, 1.0]
    #[serde(default = "default_importance")]
    pub importance: f32,

    /// Last modification time of the source the chunk came from
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    /// Human-readable name (symbol or file name)
    #[serde(default)]
    pub name: Option<String>,

    /// Custom metadata fields
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

fn default_category() -> String {
    "unknown".to_string()
}

fn default_importance() -> f32 {
    0.5
}

impl Default for ChunkMetadata {
    fn default() -> Self {
        Self {
            category: default_category(),
            framework: None,
            importance: default_importance(),
            last_modified: None,
            name: None,
            custom: HashMap::new(),
        }
    }
}

impl ChunkMetadata {
    /// Create metadata for the given category
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    /// Set importance, clamped to [0.0, 1.0]
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A unit of indexed source content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Stable identifier, unique within one project
    pub id: String,

    /// Raw source text
    pub content: String,

    /// Additional metadata
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk with default metadata
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: ChunkMetadata::default(),
        }
    }

    /// Create a new chunk with metadata
    pub fn with_metadata(
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }

    /// Name to show in result listings, falling back to the id
    pub fn display_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or(&self.id)
    }

    /// Content length in characters
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chunk_creation() {
        let chunk = Chunk::new("a", "fn main() {}");
        assert_eq!(chunk.id, "a");
        assert_eq!(chunk.metadata.category, "unknown");
        assert_eq!(chunk.metadata.importance, 0.5);
        assert_eq!(chunk.display_name(), "a");
    }

    #[test]
    fn test_content_length_counts_chars() {
        let chunk = Chunk::new("a", "héllo");
        assert_eq!(chunk.content_length(), 5);
    }

    #[test]
    fn test_metadata_builders() {
        let modified = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let metadata = ChunkMetadata::new("class")
            .with_framework("react")
            .with_importance(1.7)
            .with_last_modified(modified)
            .with_name("UserService");

        let chunk = Chunk::with_metadata("b", "class UserService {}", metadata);
        assert_eq!(chunk.metadata.framework.as_deref(), Some("react"));
        assert_eq!(chunk.metadata.importance, 1.0);
        assert_eq!(chunk.metadata.last_modified, Some(modified));
        assert_eq!(chunk.display_name(), "UserService");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let chunk: Chunk = serde_json::from_str(
            r#"{"id": "c", "content": "const x = 5;", "metadata": {"category": "variable", "owner": "core"}}"#,
        )
        .unwrap();

        assert_eq!(chunk.metadata.category, "variable");
        assert_eq!(chunk.metadata.framework, None);
        assert_eq!(chunk.metadata.importance, 0.5);
        assert_eq!(
            chunk.metadata.custom.get("owner"),
            Some(&serde_json::Value::String("core".to_string()))
        );
    }
}
