use anyhow::Result;
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use chalkline::analysis::{PhaseDetector, PreservationDetector, ScriptedParser, SlideMapper};
use chalkline::{discovery, reader, report};

#[derive(Parser, Debug)]
#[command(name = "chalkline")]
#[command(about = "Turns teacher-authored lesson-plan text into structured slide decks")]
#[command(version)]
struct Args {
    /// Lesson file, or root directory to scan for *.lesson.md / *.lesson.txt
    input: PathBuf,

    /// Rewrite deck files that already exist
    #[arg(long)]
    overwrite_all: bool,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bar
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,
}

/// Analysis components compiled once and shared across the batch.
struct Pipeline {
    preservation: PreservationDetector,
    phases: PhaseDetector,
    parser: ScriptedParser,
    mapper: SlideMapper,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: structured JSON logging enables observability and debugging in production
    tracing_subscriber::fmt()
        .with_target(false)
        .json()
        .init();

    let args = Args::parse();

    info!("Starting chalkline");
    info!(?args, "Parsed CLI arguments");

    // WHY: validate input path early to fail fast with clear error
    if !args.input.exists() {
        anyhow::bail!("Input path does not exist: {}", args.input.display());
    }

    let files: Vec<PathBuf> = if args.input.is_file() {
        vec![args.input.clone()]
    } else {
        let config = discovery::DiscoveryConfig {
            fail_fast: args.fail_fast,
        };
        discovery::collect_lesson_files(&args.input, config)
            .await?
            .into_iter()
            .filter(|f| f.error.is_none())
            .map(|f| f.path)
            .collect()
    };

    println!(
        "chalkline v{} - {} lesson files found",
        env!("CARGO_PKG_VERSION"),
        files.len()
    );

    let pipeline = Pipeline {
        preservation: PreservationDetector::new()?,
        phases: PhaseDetector::new()?,
        parser: ScriptedParser::new()?,
        mapper: SlideMapper::new(),
    };
    let reader_config = reader::ReaderConfig {
        fail_fast: args.fail_fast,
    };

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    progress.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);

    let concurrency = (num_cpus::get() / 2).max(1);
    info!("Analyzing {} files with concurrency {}", files.len(), concurrency);

    let mut results = stream::iter(files.iter())
        .map(|path| analyze_file(path, &pipeline, &reader_config, &args))
        .buffer_unordered(concurrency);

    let mut run_stats = report::RunStats::default();
    while let Some(result) = results.next().await {
        progress.inc(1);
        match result {
            Ok(stats) => {
                progress.set_message(stats.path.clone());
                run_stats.record(stats);
            }
            // Analysis errors only surface here under --fail-fast;
            // otherwise they are captured in per-file stats.
            Err(e) => {
                progress.finish_and_clear();
                return Err(e);
            }
        }
    }
    drop(results);
    progress.finish_and_clear();

    run_stats.write(&args.stats_out).await?;

    println!("Analysis complete:");
    println!("  Processed: {} files", run_stats.files_processed);
    if run_stats.files_skipped > 0 {
        println!("  Skipped (deck file exists): {}", run_stats.files_skipped);
    }
    if run_stats.files_failed > 0 {
        println!("  Failed: {}", run_stats.files_failed);
    }
    println!("  Slides built: {}", run_stats.total_slides);
    println!("  Preserved spans: {}", run_stats.total_detections);
    println!("  Stats written to: {}", args.stats_out.display());

    info!(
        "Run complete: {} processed, {} skipped, {} failed",
        run_stats.files_processed, run_stats.files_skipped, run_stats.files_failed
    );

    Ok(())
}

/// Run the full analysis pipeline over one lesson file and write its deck
/// aux output. Per-file failures become stats entries unless --fail-fast.
async fn analyze_file(
    path: &Path,
    pipeline: &Pipeline,
    reader_config: &reader::ReaderConfig,
    args: &Args,
) -> Result<report::FileStats> {
    let start = std::time::Instant::now();

    if !args.overwrite_all && report::deck_file_exists(path) {
        info!("Skipping {} (deck file exists)", path.display());
        return Ok(file_stats(path, start, "skipped", None));
    }

    let (content, read_stats) = reader::read_lesson_file(path, reader_config).await?;
    if let Some(error) = read_stats.read_error {
        return Ok(file_stats(path, start, "failed", Some(error)));
    }

    // Marker track: scripted parse, then slide mapping
    let script = pipeline.parser.parse(&content);
    let slides = pipeline.mapper.map_script(&script);

    // Free-form track: preservation and phase detection over the same text
    let preservable = pipeline.preservation.detect(&content);
    let phases = pipeline.phases.detect_phases_in_text(&content);
    let slides = pipeline
        .phases
        .assign_phases_to_slides(&slides, &phases, content.len());

    let blocks_parsed: usize = script.days.iter().map(|d| d.blocks.len()).sum();
    let analysis = report::LessonAnalysis {
        source_path: path.display().to_string(),
        preservable,
        phases,
        slides,
        parse_stats: script.stats.clone(),
        warnings: script.warnings.clone(),
    };

    if let Err(e) = report::write_deck_file(path, &analysis).await {
        if args.fail_fast {
            return Err(e);
        }
        warn!("Failed to write deck file for {}: {}", path.display(), e);
        return Ok(file_stats(
            path,
            start,
            "failed",
            Some(format!("failed to write deck file: {e}")),
        ));
    }

    let mut stats = file_stats(path, start, "success", None);
    stats.chars_processed = content.chars().count() as u64;
    stats.blocks_parsed = blocks_parsed as u64;
    stats.slides_built = analysis.slides.len() as u64;
    stats.detections = analysis.preservable.all.len() as u64;
    Ok(stats)
}

fn file_stats(
    path: &Path,
    start: std::time::Instant,
    status: &str,
    error: Option<String>,
) -> report::FileStats {
    report::FileStats {
        path: path.display().to_string(),
        chars_processed: 0,
        blocks_parsed: 0,
        slides_built: 0,
        detections: 0,
        processing_time_ms: start.elapsed().as_millis() as u64,
        status: status.to_string(),
        error,
    }
}
