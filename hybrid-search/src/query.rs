use crate::config::HybridSearchOptions;
use crate::synonyms::synonyms_for;
use crate::tokenizer::tokenize;
use indexmap::IndexSet;
use std::collections::HashSet;

/// Query terms before and after expansion
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryTerms {
    /// Terms of the query text in order, duplicates kept
    pub original: Vec<String>,
    /// Distinct original terms followed by synonym and fuzzy expansions
    pub expanded: Vec<String>,
}

impl QueryTerms {
    pub fn parse(query: &str) -> Self {
        let original = tokenize(query);
        let expanded = original.iter().cloned().collect::<IndexSet<_>>();
        Self {
            original,
            expanded: expanded.into_iter().collect(),
        }
    }

    /// Add synonyms and, when enabled, fuzzy matches produced by `fuzzy`
    /// for each original term.
    pub fn expand<F>(self, options: &HybridSearchOptions, mut fuzzy: F) -> Self
    where
        F: FnMut(&str) -> Vec<String>,
    {
        let mut expanded: IndexSet<String> = self.expanded.into_iter().collect();
        let distinct: Vec<String> = expanded.iter().cloned().collect();

        if options.synonym_expansion {
            for term in &distinct {
                expanded.extend(synonyms_for(term).iter().map(ToString::to_string));
            }
        }

        if options.fuzzy_matching {
            for term in &distinct {
                expanded.extend(fuzzy(term));
            }
        }

        Self {
            original: self.original,
            expanded: expanded.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Space-joined pairs of neighbouring original terms
    pub fn adjacent_pairs(&self) -> Vec<String> {
        self.original
            .windows(2)
            .map(|pair| pair.join(" "))
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn original_set(&self) -> HashSet<&str> {
        self.original.iter().map(String::as_str).collect()
    }
}
