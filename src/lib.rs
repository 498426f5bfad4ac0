pub mod analysis;
pub mod deck;
pub mod discovery;
pub mod reader;
pub mod report;

// Re-export main types for convenient access
pub use analysis::{
    DetectedContent, DetectedPhase, ParseStats, PhaseDetector, PreservableContent,
    PreservationDetector, ScriptResult, ScriptedParser, SlideMapper,
};
pub use deck::{LessonPhase, Slide};

// Re-export report utilities used by the CLI and integration tests
pub use report::{deck_file_exists, deck_file_path, write_deck_file, LessonAnalysis};
