use anyhow::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Configuration for lesson-file reading behavior
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
}

/// Statistics for one file read
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub bytes_read: u64,
    pub lines_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

/// Read a lesson file to a string, capturing per-file errors in stats so a
/// batch run can continue past one bad file.
pub async fn read_lesson_file(
    path: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<(String, ReadStats)> {
    let path = path.as_ref();
    let start_time = std::time::Instant::now();
    debug!("reading lesson file: {}", path.display());

    let outcome = match tokio::fs::read(path).await {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(content) => Ok(content),
            Err(e) => Err(format!(
                "File {} is not valid UTF-8: {}",
                path.display(),
                e
            )),
        },
        Err(e) => Err(format!("Failed to read file {}: {}", path.display(), e)),
    };

    match outcome {
        Ok(content) => {
            let stats = ReadStats {
                file_path: path.display().to_string(),
                bytes_read: content.len() as u64,
                lines_read: content.lines().count() as u64,
                duration_ms: start_time.elapsed().as_millis() as u64,
                read_error: None,
            };
            Ok((content, stats))
        }
        Err(error_msg) => {
            warn!("{}", error_msg);
            if config.fail_fast {
                return Err(anyhow::anyhow!(error_msg));
            }
            let stats = ReadStats {
                file_path: path.display().to_string(),
                bytes_read: 0,
                lines_read: 0,
                duration_ms: start_time.elapsed().as_millis() as u64,
                read_error: Some(error_msg),
            };
            Ok((String::new(), stats))
        }
    }
}

/// Convenience wrapper returning only the file content.
pub async fn read_file_async(path: impl AsRef<Path>) -> Result<String> {
    let (content, stats) = read_lesson_file(path, &ReaderConfig { fail_fast: true }).await?;
    debug!(
        "read {} bytes, {} lines from {}",
        stats.bytes_read, stats.lines_read, stats.file_path
    );
    Ok(content)
}
