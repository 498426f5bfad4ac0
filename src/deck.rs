// Shared slide/deck model produced by the analysis pipeline
// Consumed by external presentation, export, and AI-generation layers in the same shape

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delimiter separating narration segments inside `Slide::speaker_notes`.
/// Parsed block text never contains a blank line (continuation lines are
/// joined with single spaces), so the delimiter cannot occur inside a segment.
pub const SEGMENT_DELIMITER: &str = "\n\n";

/// Gradual Release of Responsibility stages in canonical lesson order.
/// `WeDoTogether` sits before `WeDo`; pattern dispatch relies on that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonPhase {
    Hook,
    IDo,
    WeDoTogether,
    WeDo,
    YouDo,
    Plenary,
}

impl LessonPhase {
    /// Canonical phase order used by positional heuristics and balance displays.
    pub const ORDERED: [LessonPhase; 6] = [
        LessonPhase::Hook,
        LessonPhase::IDo,
        LessonPhase::WeDoTogether,
        LessonPhase::WeDo,
        LessonPhase::YouDo,
        LessonPhase::Plenary,
    ];

    /// Wire name matching the serde encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonPhase::Hook => "hook",
            LessonPhase::IDo => "i-do",
            LessonPhase::WeDoTogether => "we-do-together",
            LessonPhase::WeDo => "we-do",
            LessonPhase::YouDo => "you-do",
            LessonPhase::Plenary => "plenary",
        }
    }

    /// Direct lookup from an explicitly authored section-heading label.
    ///
    /// Used by the slide mapper instead of the regex phase detector: heading
    /// text here was typed by the teacher, so plain label matching suffices.
    pub fn from_heading_label(label: &str) -> Option<LessonPhase> {
        let normalized = label
            .trim()
            .trim_end_matches(':')
            .trim()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "hook" | "starter" | "warm up" | "warm-up" | "do now" | "bell ringer" => {
                Some(LessonPhase::Hook)
            }
            "i do" | "direct instruction" | "teacher model" | "modelling" | "modeling" => {
                Some(LessonPhase::IDo)
            }
            "we do together" => Some(LessonPhase::WeDoTogether),
            "we do" | "guided practice" => Some(LessonPhase::WeDo),
            "you do" | "independent practice" | "independent work" | "on your own" => {
                Some(LessonPhase::YouDo)
            }
            "plenary" | "exit ticket" | "wrap up" | "wrap-up" | "recap" | "review" => {
                Some(LessonPhase::Plenary)
            }
            _ => None,
        }
    }
}

impl fmt::Display for LessonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown phase name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLessonPhaseError(pub String);

impl fmt::Display for ParseLessonPhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lesson phase: {}", self.0)
    }
}

impl std::error::Error for ParseLessonPhaseError {}

impl FromStr for LessonPhase {
    type Err = ParseLessonPhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LessonPhase::ORDERED
            .iter()
            .find(|phase| phase.as_str() == s)
            .copied()
            .ok_or_else(|| ParseLessonPhaseError(s.to_string()))
    }
}

/// One content bullet on a slide.
/// Question bullets get dedicated reveal treatment in the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideContentItem {
    pub text: String,
    #[serde(default)]
    pub is_question: bool,
}

impl SlideContentItem {
    pub fn bullet(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_question: false,
        }
    }

    pub fn question(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_question: true,
        }
    }
}

/// Slide rendering variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideKind {
    #[default]
    Content,
    WorkTogether,
}

/// One slide in a deck. Same shape whether built by the slide mapper or by
/// an external AI generation step.
///
/// Invariant (progressive disclosure): the narration in `speaker_notes`
/// always holds `content.len() + 1` segments, one spoken before each bullet
/// is revealed plus one trailing segment after the last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    pub content: Vec<SlideContentItem>,
    /// Narration string divided into segments by [`SEGMENT_DELIMITER`].
    pub speaker_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_phase: Option<LessonPhase>,
    #[serde(default)]
    pub kind: SlideKind,
}

impl Slide {
    /// Narration segments in reveal order.
    pub fn speaker_segments(&self) -> impl Iterator<Item = &str> {
        self.speaker_notes.split(SEGMENT_DELIMITER)
    }

    pub fn segment_count(&self) -> usize {
        self.speaker_segments().count()
    }

    /// Join narration segments into the stored `speaker_notes` form.
    pub fn join_segments(segments: &[String]) -> String {
        segments.join(SEGMENT_DELIMITER)
    }
}
