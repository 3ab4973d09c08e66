//! Vision bias extraction.
//!
//! Turns the free-text vision statement into a short, ordered keyword list.
//! Term frequency over a stopword-filtered token stream, ties broken by first
//! occurrence. Pure: no randomness, no I/O.

use std::collections::HashMap;

/// Words that carry no intent on their own
const STOPWORDS: &[&str] = &[
    "a", "about", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "do", "does", "for", "from", "get", "going", "had", "has",
    "have", "how", "i", "if", "in", "into", "is", "it", "its", "just", "like", "make", "me",
    "more", "most", "my", "need", "no", "not", "of", "on", "only", "or", "our", "out", "over",
    "really", "should", "so", "some", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "to", "too", "up", "us", "use", "using", "very", "want", "was", "we",
    "what", "when", "where", "which", "while", "who", "why", "will", "with", "would", "you",
    "your",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.binary_search(&token).is_ok()
}

/// Lowercased tokens; `-` and `+` stay inside words ("privacy-first", "c++")
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '+'))
        .map(|s| s.trim_matches('-'))
        .filter(|s| s.chars().count() >= 2)
        .map(String::from)
        .collect()
}

/// Tokens that carry meaning: no stopwords, no bare numbers
pub fn content_terms(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !is_stopword(t))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// Extract at most `cap` bias keywords from the vision text
pub fn extract_bias(vision: &str, cap: usize) -> Vec<String> {
    let tokens = content_terms(vision);

    // token -> (count, first position)
    let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, token) in tokens.iter().enumerate() {
        stats
            .entry(token.as_str())
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, pos));
    }

    let mut ranked: Vec<(&str, usize, usize)> = stats
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(cap)
        .map(|(token, _, _)| token.to_string())
        .collect()
}

/// Query followed by bias terms it does not already contain
pub fn compose_query(query: &str, bias: &[String], max_terms: usize) -> String {
    let present: Vec<String> = tokenize(query);
    let extra: Vec<&str> = bias
        .iter()
        .filter(|term| !present.contains(term))
        .take(max_terms)
        .map(String::as_str)
        .collect();

    if extra.is_empty() {
        query.trim().to_string()
    } else {
        format!("{} {}", query.trim(), extra.join(" "))
    }
}

/// Fraction of bias keywords present in `text`, in [0, 1]
pub fn bias_affinity(text: &str, bias: &[String]) -> f64 {
    if bias.is_empty() {
        return 0.0;
    }
    let tokens = tokenize(text);
    let hits = bias.iter().filter(|term| tokens.contains(term)).count();
    hits as f64 / bias.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwords_sorted_for_binary_search() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
    }

    #[test]
    fn test_empty_vision_yields_nothing() {
        assert!(extract_bias("", 6).is_empty());
        assert!(extract_bias("   \n\t", 6).is_empty());
        assert!(extract_bias("the and of", 6).is_empty());
    }

    #[test]
    fn test_extracts_intent_words() {
        let bias = extract_bias("privacy-first Ubuntu", 6);
        assert_eq!(bias, vec!["privacy-first", "ubuntu"]);
    }

    #[test]
    fn test_frequency_then_first_occurrence() {
        let bias = extract_bias(
            "I want offline tools. Offline first, open source, source available, offline.",
            6,
        );
        assert_eq!(bias[0], "offline");
        assert_eq!(bias[1], "source");
        assert_eq!(bias[2], "tools");
    }

    #[test]
    fn test_cap_and_dedup() {
        let bias = extract_bias("alpha beta gamma delta epsilon zeta eta theta alpha", 4);
        assert_eq!(bias.len(), 4);
        assert_eq!(bias[0], "alpha");
        let mut unique = bias.clone();
        unique.dedup();
        assert_eq!(unique.len(), bias.len());
    }

    #[test]
    fn test_deterministic() {
        let text = "Local-first, privacy respecting, runs on a Raspberry Pi 5 with Ubuntu";
        assert_eq!(extract_bias(text, 6), extract_bias(text, 6));
        assert!(!extract_bias(text, 6).contains(&"5".to_string()));
    }

    #[test]
    fn test_compose_query_skips_present_terms() {
        let bias = vec!["ubuntu".to_string(), "privacy-first".to_string(), "offline".to_string()];
        assert_eq!(
            compose_query("install on Ubuntu", &bias, 2),
            "install on Ubuntu privacy-first offline"
        );
        assert_eq!(compose_query("x", &[], 3), "x");
        assert_eq!(compose_query("x", &bias, 0), "x");
    }

    #[test]
    fn test_bias_affinity() {
        let bias = vec!["ubuntu".to_string(), "privacy".to_string()];
        assert_eq!(bias_affinity("Hardening Ubuntu servers", &bias), 0.5);
        assert_eq!(bias_affinity("Ubuntu privacy guide", &bias), 1.0);
        assert_eq!(bias_affinity("anything", &[]), 0.0);
    }
}
