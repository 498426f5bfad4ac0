// Aux deck output and run statistics
// Each analyzed lesson file gets a sibling `<stem>_deck.json`; a batch run
// aggregates per-file stats into a single report for the --stats-out path.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::{DetectedPhase, ParseStats, PreservableContent};
use crate::deck::Slide;
use crate::discovery::LESSON_SUFFIXES;

/// Full analysis of one lesson file, serialized as the deck aux output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonAnalysis {
    pub source_path: String,
    pub preservable: PreservableContent,
    pub phases: Vec<DetectedPhase>,
    pub slides: Vec<Slide>,
    pub parse_stats: ParseStats,
    pub warnings: Vec<String>,
}

/// Generate the deck aux file path for a given lesson source file.
pub fn deck_file_path(source_path: &Path) -> PathBuf {
    let file_name = source_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    let stem = LESSON_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or_else(|| file_name.split('.').next().unwrap_or(file_name));

    let mut aux_path = source_path.to_path_buf();
    aux_path.set_file_name(format!("{stem}_deck.json"));
    aux_path
}

/// Check whether the deck aux file for a source already exists.
pub fn deck_file_exists<P: AsRef<Path>>(source_path: P) -> bool {
    deck_file_path(source_path.as_ref()).exists()
}

/// Write a deck aux file next to its lesson source.
pub async fn write_deck_file(source_path: &Path, analysis: &LessonAnalysis) -> Result<PathBuf> {
    let aux_path = deck_file_path(source_path);
    let content = serde_json::to_string_pretty(analysis)?;
    tokio::fs::write(&aux_path, content).await?;
    Ok(aux_path)
}

/// Per-file processing statistics for the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub path: String,
    pub chars_processed: u64,
    pub blocks_parsed: u64,
    pub slides_built: u64,
    pub detections: u64,
    pub processing_time_ms: u64,
    /// Processing status (success, skipped, failed)
    pub status: String,
    pub error: Option<String>,
}

/// Aggregate statistics for one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub total_slides: u64,
    pub total_detections: u64,
    pub files: Vec<FileStats>,
}

impl RunStats {
    pub fn record(&mut self, stats: FileStats) {
        match stats.status.as_str() {
            "success" => {
                self.files_processed += 1;
                self.total_slides += stats.slides_built;
                self.total_detections += stats.detections;
            }
            "skipped" => self.files_skipped += 1,
            _ => self.files_failed += 1,
        }
        self.files.push(stats);
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
