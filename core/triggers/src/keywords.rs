//! Keyword tables used by the trigger classifiers.
//!
//! All entries are lowercase and matched as plain substrings of the
//! lowercased message, so a keyword also fires inside longer words.
//! Keywords whose common hosts are unrelated ("war" in "software") are left
//! out. Hosts that are still on topic are accepted: "paper" fires inside
//! "newspaper", which routes that message to the paper index as well.

/// News and current-events vocabulary.
pub const NEWS_KEYWORDS: &[&str] = &[
    "news",
    "breaking",
    "headline",
    "latest",
    "today",
    "tonight",
    "yesterday",
    "this week",
    "current events",
    "happening",
    "recent developments",
    "just announced",
    "press release",
];

/// Global and political vocabulary.
pub const GLOBAL_KEYWORDS: &[&str] = &[
    "global",
    "world",
    "international",
    "countries",
    "country",
    "geopolitic",
    "politic",
    "government",
    "election",
    "president",
    "prime minister",
    "diplomac",
    "united nations",
    "foreign policy",
    "summit",
    "sanction",
];

/// Crisis and conflict vocabulary.
pub const CRISIS_KEYWORDS: &[&str] = &[
    "crisis",
    "conflict",
    "warfare",
    "invasion",
    "attack",
    "military",
    "ceasefire",
    "violence",
    "protest",
    "disaster",
    "earthquake",
    "flood",
    "hurricane",
    "wildfire",
    "emergency",
    "refugee",
    "pandemic",
    "outbreak",
];

/// Economic vocabulary.
pub const ECONOMIC_KEYWORDS: &[&str] = &[
    "economy",
    "economic",
    "inflation",
    "recession",
    "stock market",
    "stocks",
    "interest rate",
    "gdp",
    "unemployment",
    "tariff",
    "trade deal",
    "currency",
    "central bank",
];

/// Phrases that ask about events without using any category vocabulary.
pub const EVENT_TRIGGER_PHRASES: &[&str] = &[
    "what's going on",
    "what is going on",
    "what happened",
    "what's happening",
    "any updates on",
    "situation in",
    "events in",
    "tell me about the situation",
];

/// Academic and research vocabulary.
pub const PAPER_KEYWORDS: &[&str] = &[
    "paper",
    "research",
    "arxiv",
    "algorithm",
    "neural",
    "transformer",
    "preprint",
    "publication",
    "journal",
    "peer review",
    "citation",
    "scientific",
    "academic",
    "study",
    "studies",
    "machine learning",
    "deep learning",
    "reinforcement learning",
    "large language model",
    "dataset",
    "benchmark",
    "theorem",
];

/// Phrases that ask for literature without using the vocabulary above.
pub const PAPER_TRIGGER_PHRASES: &[&str] = &[
    "state of the art",
    "state-of-the-art",
    "latest findings",
    "recent advances",
    "literature on",
    "who proposed",
];

/// Returns the first entry of `table` contained in `lowered`.
pub fn first_match(lowered: &str, table: &[&'static str]) -> Option<&'static str> {
    table.iter().copied().find(|kw| lowered.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tables() -> Vec<(&'static str, &'static [&'static str])> {
        vec![
            ("news", NEWS_KEYWORDS),
            ("global", GLOBAL_KEYWORDS),
            ("crisis", CRISIS_KEYWORDS),
            ("economic", ECONOMIC_KEYWORDS),
            ("event phrases", EVENT_TRIGGER_PHRASES),
            ("paper", PAPER_KEYWORDS),
            ("paper phrases", PAPER_TRIGGER_PHRASES),
        ]
    }

    #[test]
    fn test_tables_are_lowercase_and_non_empty() {
        for (name, table) in all_tables() {
            assert!(!table.is_empty(), "{} table is empty", name);
            for kw in table {
                assert!(!kw.trim().is_empty(), "blank keyword in {}", name);
                assert_eq!(*kw, kw.to_lowercase(), "{} keyword not lowercase", name);
            }
        }
    }

    #[test]
    fn test_first_match() {
        assert_eq!(first_match("breaking story", NEWS_KEYWORDS), Some("breaking"));
        assert_eq!(first_match("software release", CRISIS_KEYWORDS), None);
    }
}
