//! Near-duplicate detection for block entries.
//!
//! Known weakness: character-set overlap says nothing about meaning. Two
//! different entries rendered through the same template (same label, same
//! metadata layout, similar length) can share almost every character and
//! be reported as similar. See `test_shared_template_false_positive`.

use std::collections::HashSet;

/// Below this shorter/longer length ratio only containment counts.
pub const LENGTH_RATIO_THRESHOLD: f64 = 0.8;

/// Character-set overlap above which comparable-length texts are similar.
pub const CHAR_OVERLAP_THRESHOLD: f64 = 0.9;

/// Whether `a` and `b` are the same content for deduplication purposes.
///
/// Inputs are trimmed and lowercased, nothing else. Empty input is never
/// similar to anything, itself included.
pub fn is_similar(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a.is_empty() || b.is_empty() {
        return false;
    }

    if a == b {
        return true;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let ratio = len_a.min(len_b) as f64 / len_a.max(len_b) as f64;

    if ratio < LENGTH_RATIO_THRESHOLD {
        return a.contains(&b) || b.contains(&a);
    }

    char_overlap(&a, &b) > CHAR_OVERLAP_THRESHOLD
}

/// `|chars(a) ∩ chars(b)| / |chars(a) ∪ chars(b)|`.
pub fn char_overlap(a: &str, b: &str) -> f64 {
    let chars_a: HashSet<char> = a.chars().collect();
    let chars_b: HashSet<char> = b.chars().collect();

    let union = chars_a.union(&chars_b).count();
    if union == 0 {
        return 0.0;
    }

    chars_a.intersection(&chars_b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive_for_non_empty() {
        for text in ["a", "rust", "  Mixed Case  ", "ünïcödé text", "2+2"] {
            assert!(is_similar(text, text), "{:?} not similar to itself", text);
        }
    }

    #[test]
    fn test_empty_never_similar() {
        for other in ["", " ", "anything", "\n"] {
            assert!(!is_similar("", other));
            assert!(!is_similar(other, ""));
        }
        assert!(!is_similar("   ", "   "));
    }

    #[test]
    fn test_case_and_outer_whitespace_ignored() {
        assert!(is_similar("  Breaking News ", "breaking news"));
    }

    #[test]
    fn test_containment_for_different_lengths() {
        assert!(is_similar("The quick brown fox", "quick brown"));
        assert!(!is_similar("The quick brown fox", "lazy dog"));
    }

    #[test]
    fn test_comparable_lengths_use_char_overlap() {
        // Same characters in a different order
        assert!(is_similar("hello world", "world hello"));
        assert!(!is_similar("abc", "xyz"));
        assert!(!is_similar(
            "Global markets rallied today after the central bank held interest rates steady.",
            "Severe flooding displaced thousands of residents across the northern region."
        ));
    }

    #[test]
    fn test_shared_template_false_positive() {
        // Two different papers rendered through the same entry template.
        // They are reported as similar even though the content differs;
        // this pins the current behaviour of the heuristic.
        let existing = "arxiv | Machine Learning Optimization\n\
                        Authors: A. Smith | Published: 2024-03-02\n\
                        We study optimization methods for training machine learning models.";
        let incoming = "arxiv | Neural Network Architectures\n\
                        Authors: A. Smith | Published: 2024-03-02\n\
                        We survey neural network architectures for image recognition by size.";

        assert!(char_overlap(&existing.to_lowercase(), &incoming.to_lowercase()) > 0.9);
        assert!(is_similar(existing, incoming));
    }

    #[test]
    fn test_char_overlap_bounds() {
        assert_eq!(char_overlap("", ""), 0.0);
        assert_eq!(char_overlap("ab", "ab"), 1.0);
        assert_eq!(char_overlap("ab", "bc"), 1.0 / 3.0);
    }
}
