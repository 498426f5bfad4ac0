// Deterministic lesson-text analysis pipeline
// Four pure-function components: content preservation detection, phase
// detection, scripted parsing, and slide mapping. No I/O, no network; all
// functions are referentially transparent over in-memory text.

use serde::{Deserialize, Serialize};

pub mod action_verbs;
pub mod phase_detector;
pub mod phase_patterns;
pub mod preservation;
pub mod scripted_parser;
pub mod slide_mapper;

// Re-export core types
pub use phase_detector::{DetectedPhase, PhaseDetector};
pub use preservation::{
    ContentKind, DetectedContent, MomentCategory, PreservableContent, PreservationDetector,
    TeachableMoment,
};
pub use scripted_parser::{
    ParseStats, ScriptResult, ScriptedBlock, ScriptedBlockKind, ScriptedDay, ScriptedParser,
};
pub use slide_mapper::SlideMapper;

/// Detection confidence, ordered weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// How a span was recognized, ordered least to most specific.
///
/// The variant order is load-bearing: it breaks confidence ties during
/// overlap resolution (`Context` beats `InstructionPrefix` beats
/// `NumberedList` beats `ActionVerb` beats `Punctuation`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMethod {
    Punctuation,
    ActionVerb,
    NumberedList,
    InstructionPrefix,
    Context,
}
