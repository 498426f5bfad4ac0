// Centralized action-verb handling for activity detection
// A sentence opening with one of these Bloom's-taxonomy verbs reads as a
// task for students rather than narration

use std::collections::HashSet;

/// Verbs that open activity prompts ("List three...", "Compare the...").
/// Both -ize and -ise spellings are kept; teachers author in either.
pub const ACTION_VERBS: &[&str] = &[
    "analyse",
    "analyze",
    "apply",
    "arrange",
    "calculate",
    "classify",
    "compare",
    "complete",
    "contrast",
    "create",
    "define",
    "describe",
    "design",
    "discuss",
    "draw",
    "evaluate",
    "explain",
    "identify",
    "investigate",
    "justify",
    "label",
    "list",
    "match",
    "name",
    "predict",
    "solve",
    "sort",
    "summarise",
    "summarize",
    "write",
];

/// Efficient verb lookup using HashSet for O(1) membership checks.
pub struct ActionVerbChecker {
    verbs: HashSet<&'static str>,
}

impl ActionVerbChecker {
    pub fn new() -> Self {
        Self {
            verbs: ACTION_VERBS.iter().copied().collect(),
        }
    }

    /// Check if a single word is a known action verb.
    /// Surrounding punctuation is stripped before lookup.
    pub fn is_action_verb(&self, word: &str) -> bool {
        let clean: String = word
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_lowercase();
        self.verbs.contains(clean.as_str())
    }

    /// Check if a sentence opens with an action verb.
    pub fn starts_with_action_verb(&self, sentence: &str) -> bool {
        match sentence.split_whitespace().next() {
            Some(first) => self.is_action_verb(first),
            None => false,
        }
    }
}

impl Default for ActionVerbChecker {
    fn default() -> Self {
        Self::new()
    }
}
