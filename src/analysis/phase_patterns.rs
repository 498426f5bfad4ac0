// Ordered phase rule table consumed by the phase detector
// Array order is a first-class contract: entries are tried, and allowed to
// consume text, in this exact order. `we-do-together` sits before `we-do`
// so "We Do Together" is never tokenized as a `we-do` match plus a
// dangling "Together".

use crate::deck::LessonPhase;

/// One phase's rule set.
///
/// Structural patterns anchor to a line start, heading hashes, or bullet
/// prefix and match with high confidence. Content patterns match anywhere
/// in body text with medium confidence.
#[derive(Debug, Clone, Copy)]
pub struct PhasePatternSpec {
    pub phase: LessonPhase,
    pub structural: &'static [&'static str],
    pub content: &'static [&'static str],
}

/// The phase dictionary, in canonical order.
/// Modeled as an explicit ordered slice, never a map: iteration order is
/// what keeps longer labels ahead of their shorter prefixes.
pub const PHASE_PATTERNS: &[PhasePatternSpec] = &[
    PhasePatternSpec {
        phase: LessonPhase::Hook,
        structural: &[
            r"(?im)^[ \t]*(?:#{1,3}[ \t]*|[-*][ \t]+)?(?:hook|starter|warm[ -]?up|do now|bell[ -]?ringer)\b:?",
        ],
        content: &[
            r"(?i)\b(?:hook|warm[ -]?up activity|grab (?:their|the class'?s?) attention)\b",
        ],
    },
    PhasePatternSpec {
        phase: LessonPhase::IDo,
        structural: &[
            r"(?im)^[ \t]*(?:#{1,3}[ \t]*|[-*][ \t]+)?(?:i do|direct instruction|teacher model(?:ing|ling)?|model(?:ing|ling))\b:?",
        ],
        content: &[
            r"(?i)\b(?:i(?:'ll| will| am going to) (?:show|model|demonstrate)|watch (?:me|how i))\b",
        ],
    },
    PhasePatternSpec {
        phase: LessonPhase::WeDoTogether,
        structural: &[
            r"(?im)^[ \t]*(?:#{1,3}[ \t]*|[-*][ \t]+)?we do together\b:?",
        ],
        content: &[r"(?i)\bwe do together\b"],
    },
    PhasePatternSpec {
        phase: LessonPhase::WeDo,
        structural: &[
            r"(?im)^[ \t]*(?:#{1,3}[ \t]*|[-*][ \t]+)?(?:we do|guided practice)\b:?",
        ],
        content: &[
            r"(?i)\b(?:we do|guided practice|let'?s try (?:one|this) together)\b",
        ],
    },
    PhasePatternSpec {
        phase: LessonPhase::YouDo,
        structural: &[
            r"(?im)^[ \t]*(?:#{1,3}[ \t]*|[-*][ \t]+)?(?:you do|independent (?:practice|work)|on your own)\b:?",
        ],
        content: &[
            r"(?i)\b(?:you do|independent practice|on your own|your turn)\b",
        ],
    },
    PhasePatternSpec {
        phase: LessonPhase::Plenary,
        structural: &[
            r"(?im)^[ \t]*(?:#{1,3}[ \t]*|[-*][ \t]+)?(?:plenary|exit ticket|wrap[ -]?up|recap|review)\b:?",
        ],
        content: &[
            r"(?i)\b(?:plenary|exit ticket|wrap[ -]?up|recap|what (?:did|have) we learn(?:ed|t)?)\b",
        ],
    },
];
