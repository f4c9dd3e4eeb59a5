//! Representative keyword extraction for report groups
//!
//! Terms are lowercase word tokens of two or more characters with English
//! stop words removed, plus bigrams of consecutive remaining tokens. Terms
//! are ranked by frequency, ties broken alphabetically.

use std::collections::HashMap;

/// Number of keywords shown per group
pub const DEFAULT_TOP_N: usize = 5;

/// Shown when a group has no usable terms
pub const NO_KEYWORDS: &str = "N/A";

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no",
    "nor", "not", "now", "of", "off", "on", "once", "one", "only", "or", "other", "our", "ours",
    "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "upon", "us", "very", "was",
    "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

/// Splits text into lowercase word tokens of at least two characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Returns the `top_n` most frequent unigrams and bigrams
///
/// # Examples
///
/// ```
/// use link_digest::output::extract_keywords;
///
/// let keywords = extract_keywords("rust async rust tokio runtime rust", 2);
/// assert_eq!(keywords, vec!["rust", "async"]);
/// ```
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let tokens: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|t| !is_stop_word(t))
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in &tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(term, _)| term)
        .collect()
}

/// Keywords joined for display, or `N/A` if there are none
pub fn keyword_line(text: &str, top_n: usize) -> String {
    let keywords = extract_keywords(text, top_n);
    if keywords.is_empty() {
        NO_KEYWORDS.to_string()
    } else {
        keywords.join(", ")
    }
}
