use anyhow::Result;
use glob::glob;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// File suffixes recognized as lesson-plan sources.
pub const LESSON_SUFFIXES: &[&str] = &[".lesson.md", ".lesson.txt"];

/// Configuration for lesson-file discovery behavior
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
}

/// Result of lesson-file discovery validation
#[derive(Debug, Clone)]
pub struct FileValidation {
    pub path: PathBuf,
    pub error: Option<String>,
}

/// Discover all lesson files under the given root directory, recursively.
/// Results are sorted by path so batch runs process files in a stable order.
pub async fn collect_lesson_files(
    root_dir: impl AsRef<Path>,
    config: DiscoveryConfig,
) -> Result<Vec<FileValidation>> {
    let root_dir = root_dir.as_ref();
    let mut files = Vec::new();

    for suffix in LESSON_SUFFIXES {
        let pattern = format!("{}/**/*{}", root_dir.display(), suffix);
        debug!("discovering lesson files with pattern: {}", pattern);

        for entry in glob(&pattern)? {
            match entry {
                Ok(path) => {
                    debug!("found lesson file: {}", path.display());
                    files.push(validate_file(path, &config).await?);
                }
                Err(e) => {
                    let error_msg = format!("glob iteration error: {e}");
                    warn!("{}", error_msg);
                    if config.fail_fast {
                        anyhow::bail!(error_msg);
                    }
                }
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);

    let valid_count = files.iter().filter(|f| f.error.is_none()).count();
    let invalid_count = files.len() - valid_count;
    if invalid_count > 0 {
        warn!("found {} lesson files with validation issues", invalid_count);
    }
    info!(
        "lesson discovery summary: {} valid, {} invalid",
        valid_count, invalid_count
    );

    Ok(files)
}

async fn validate_file(path: PathBuf, config: &DiscoveryConfig) -> Result<FileValidation> {
    match fs::metadata(&path).await {
        Ok(metadata) => {
            if !metadata.is_file() {
                let error = format!("Path is not a file: {}", path.display());
                warn!("{}", error);
                return Ok(FileValidation {
                    path,
                    error: Some(error),
                });
            }
        }
        Err(e) => {
            let error = format!("Cannot access file {}: {}", path.display(), e);
            warn!("{}", error);
            if config.fail_fast {
                anyhow::bail!(error);
            }
            return Ok(FileValidation {
                path,
                error: Some(error),
            });
        }
    }

    Ok(FileValidation { path, error: None })
}

/// Convenience function returning only valid lesson file paths.
pub async fn find_lesson_files<P: AsRef<Path>>(root_dir: P) -> Result<Vec<PathBuf>> {
    let validations = collect_lesson_files(root_dir, DiscoveryConfig::default()).await?;
    Ok(validations
        .into_iter()
        .filter(|v| v.error.is_none())
        .map(|v| v.path)
        .collect())
}
