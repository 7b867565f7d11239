/// Minimum normalized similarity for a fuzzy term match
pub const FUZZY_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Levenshtein distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// `1 - distance / max(len)`, 1.0 for two empty strings
pub fn similarity(a: &str, b: &str) -> f32 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / longest as f32
}

/// Vocabulary terms similar enough to `term`, excluding `term` itself,
/// sorted for deterministic expansion order.
pub fn fuzzy_matches<'a>(term: &str, vocabulary: impl Iterator<Item = &'a str>) -> Vec<String> {
    let term_len = term.chars().count();
    let mut matches: Vec<String> = vocabulary
        .filter(|candidate| *candidate != term)
        .filter(|candidate| {
            // the length gap alone bounds the distance from below
            let candidate_len = candidate.chars().count();
            let longest = term_len.max(candidate_len).max(1);
            let gap = term_len.abs_diff(candidate_len);
            1.0 - gap as f32 / longest as f32 >= FUZZY_SIMILARITY_THRESHOLD
        })
        .filter(|candidate| similarity(term, candidate) >= FUZZY_SIMILARITY_THRESHOLD)
        .map(str::to_string)
        .collect();
    matches.sort();
    matches
}
