//! Term, keyword and phrase extraction shared by indexing and querying.

use indexmap::IndexSet;
use regex_lite::Regex;
use std::sync::LazyLock;

/// Keywords kept per document
pub const MAX_KEYWORDS: usize = 20;

/// Phrases kept per document
pub const MAX_PHRASES: usize = 50;

/// Vocabulary treated as keywords even when written in lower case
const TECHNICAL_TERMS: &[&str] = &[
    "api",
    "async",
    "auth",
    "await",
    "cache",
    "class",
    "component",
    "config",
    "controller",
    "database",
    "endpoint",
    "error",
    "function",
    "handler",
    "hook",
    "http",
    "interface",
    "middleware",
    "model",
    "module",
    "promise",
    "query",
    "request",
    "response",
    "route",
    "router",
    "schema",
    "service",
    "state",
    "test",
    "token",
    "validation",
];

static IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").ok());

fn is_term_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-')
}

/// Split text into lower-cased terms.
///
/// `.` and `-` stay inside terms so that `user.service` and `get-data` survive
/// as single tokens; they are trimmed from the edges.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !is_term_char(c))
        .map(|raw| raw.trim_matches(|c: char| c == '.' || c == '-'))
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Identifier-like tokens with an embedded capital (`getUser`,
/// `UserService`) plus members of the technical vocabulary, lower-cased.
pub fn extract_keywords(text: &str) -> IndexSet<String> {
    let mut keywords = IndexSet::new();
    let Some(identifier) = IDENTIFIER.as_ref() else {
        return keywords;
    };

    for found in identifier.find_iter(text) {
        let word = found.as_str();
        let lower = word.to_lowercase();
        let embedded_upper = word.chars().skip(1).any(char::is_uppercase);
        if embedded_upper || TECHNICAL_TERMS.contains(&lower.as_str()) {
            keywords.insert(lower);
            if keywords.len() == MAX_KEYWORDS {
                break;
            }
        }
    }

    keywords
}

/// Two- and three-term windows over consecutive tokens, in order of
/// appearance.
pub fn extract_phrases(tokens: &[String]) -> IndexSet<String> {
    let mut phrases = IndexSet::new();
    for start in 0..tokens.len() {
        for width in [2, 3] {
            let Some(window) = tokens.get(start..start + width) else {
                continue;
            };
            phrases.insert(window.join(" "));
            if phrases.len() == MAX_PHRASES {
                return phrases;
            }
        }
    }
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokenize_code() {
        assert_eq!(
            tokenize("function getUser(id) { return db.find(id); }"),
            vec!["function", "getuser", "id", "return", "db.find", "id"]
        );
    }

    #[test]
    fn test_tokenize_keeps_technical_identifiers() {
        assert_eq!(
            tokenize("import user.service from 'get-data'; snake_case"),
            vec!["import", "user.service", "from", "get-data", "snake", "case"]
        );
    }

    #[test]
    fn test_tokenize_trims_edge_punctuation() {
        assert_eq!(tokenize("end. -flag ... --"), vec!["end", "flag"]);
        assert!(tokenize("{ } ( ) ;").is_empty());
    }

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords("class UserService { getUser() { return cache.get(x) } }");
        let keywords: Vec<&str> = keywords.iter().map(String::as_str).collect();
        assert_eq!(keywords, vec!["class", "userservice", "getuser", "cache"]);
    }

    #[test]
    fn test_keywords_are_capped() {
        let text = (0..40)
            .map(|i| format!("someName{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(extract_keywords(&text).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_extract_phrases() {
        let tokens = tokenize("class UserService getUser");
        let extracted = extract_phrases(&tokens);
        let phrases: Vec<&str> = extracted.iter().map(String::as_str).collect();
        assert_eq!(
            phrases,
            vec![
                "class userservice",
                "class userservice getuser",
                "userservice getuser"
            ]
        );
    }

    #[test]
    fn test_phrases_are_capped() {
        let tokens: Vec<String> = (0..100).map(|i| format!("t{i}")).collect();
        assert_eq!(extract_phrases(&tokens).len(), MAX_PHRASES);
    }

    #[test]
    fn test_single_token_has_no_phrases() {
        assert!(extract_phrases(&tokenize("alone")).is_empty());
    }
}
