// End-to-end pipeline coverage: discovery, reading, analysis, deck output
// Mirrors what the CLI does for each file in a batch run.

use chalkline::analysis::{PhaseDetector, PreservationDetector, ScriptedParser, SlideMapper};
use chalkline::{discovery, reader, report};
use tempfile::TempDir;

const LESSON_TEXT: &str = "\
## Day 1: Rivers

## Hook
Say: Look closely at this aerial photograph.
Ask: What do you think carved this valley?

## I Do
Say: Watch while I trace the river from source to mouth.
Write on board: source, tributary, mouth

## You Do
Activity: In pairs, label the river features on your own map and agree a caption for each one.
Ask: Which feature was hardest to spot?

## Plenary
Say: Let us recap what a tributary is.
";

async fn write_lesson(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(&path, content).await.unwrap();
    path
}

#[tokio::test]
async fn test_full_pipeline_produces_deck_file() {
    let temp_dir = TempDir::new().unwrap();
    let lesson_path = write_lesson(&temp_dir, "rivers.lesson.md", LESSON_TEXT).await;

    // Discovery
    let files = discovery::find_lesson_files(temp_dir.path()).await.unwrap();
    assert_eq!(files, vec![lesson_path.clone()]);

    // Reading
    let content = reader::read_file_async(&files[0]).await.unwrap();
    assert_eq!(content, LESSON_TEXT);

    // Analysis
    let parser = ScriptedParser::new().unwrap();
    let mapper = SlideMapper::new();
    let preservation = PreservationDetector::new().unwrap();
    let phase_detector = PhaseDetector::new().unwrap();

    let script = parser.parse(&content);
    assert_eq!(script.stats.total_days, 1);

    let slides = mapper.map_script(&script);
    assert!(slides.len() >= 4, "headings and ask flushes split the deck");
    for slide in &slides {
        assert_eq!(slide.segment_count(), slide.content.len() + 1);
    }

    let preservable = preservation.detect(&content);
    assert!(!preservable.questions.is_empty());

    let phases = phase_detector.detect_phases_in_text(&content);
    assert!(!phases.is_empty());
    let slides = phase_detector.assign_phases_to_slides(&slides, &phases, content.len());

    // Deck output
    let analysis = report::LessonAnalysis {
        source_path: files[0].display().to_string(),
        preservable,
        phases,
        slides,
        parse_stats: script.stats.clone(),
        warnings: script.warnings.clone(),
    };
    let aux_path = report::write_deck_file(&files[0], &analysis).await.unwrap();
    assert!(aux_path.to_string_lossy().ends_with("rivers_deck.json"));
    assert!(report::deck_file_exists(&files[0]));

    // The written deck parses back into the same shapes.
    let raw = tokio::fs::read_to_string(&aux_path).await.unwrap();
    let parsed: report::LessonAnalysis = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.slides.len(), analysis.slides.len());
    assert_eq!(parsed.preservable, analysis.preservable);
}

#[tokio::test]
async fn test_pipeline_handles_freeform_text_without_markers() {
    let temp_dir = TempDir::new().unwrap();
    let freeform = "\
Today we will learn about the water cycle and why rain falls.
Where does the water in clouds come from?
Explain the journey of a raindrop to your partner.
";
    let path = write_lesson(&temp_dir, "water.lesson.txt", freeform).await;

    let content = reader::read_file_async(&path).await.unwrap();
    let parser = ScriptedParser::new().unwrap();
    let mapper = SlideMapper::new();

    // Unmarked prose becomes implicit narration; nothing errors.
    let script = parser.parse(&content);
    assert_eq!(script.stats.total_days, 1);
    assert!(script.stats.implicit_say_blocks >= 1);

    let slides = mapper.map_script(&script);
    for slide in &slides {
        assert_eq!(slide.segment_count(), slide.content.len() + 1);
    }

    let preservation = PreservationDetector::new().unwrap();
    let preservable = preservation.detect(&content);
    assert!(preservable
        .questions
        .iter()
        .any(|q| q.text.contains("clouds")));
    assert!(preservable
        .activities
        .iter()
        .any(|a| a.text.starts_with("Explain")));
}

#[tokio::test]
async fn test_batch_of_multiple_lesson_files() {
    let temp_dir = TempDir::new().unwrap();
    write_lesson(&temp_dir, "unit1/a.lesson.md", "## Day 1\nSay: First lesson narration.").await;
    write_lesson(&temp_dir, "unit2/b.lesson.md", "## Day 1\nSay: Second lesson narration.").await;

    let files = discovery::find_lesson_files(temp_dir.path()).await.unwrap();
    assert_eq!(files.len(), 2);

    let parser = ScriptedParser::new().unwrap();
    let mapper = SlideMapper::new();
    let mut run_stats = report::RunStats::default();

    for path in &files {
        let content = reader::read_file_async(path).await.unwrap();
        let script = parser.parse(&content);
        let slides = mapper.map_script(&script);
        assert!(!slides.is_empty(), "file {:?} should produce slides", path);

        run_stats.record(report::FileStats {
            path: path.display().to_string(),
            chars_processed: content.chars().count() as u64,
            blocks_parsed: script.days.iter().map(|d| d.blocks.len()).sum::<usize>() as u64,
            slides_built: slides.len() as u64,
            detections: 0,
            processing_time_ms: 0,
            status: "success".to_string(),
            error: None,
        });
    }

    assert_eq!(run_stats.files_processed, 2);
    assert_eq!(run_stats.total_slides, 2);

    let stats_path = temp_dir.path().join("run_stats.json");
    run_stats.write(&stats_path).await.unwrap();
    let raw = tokio::fs::read_to_string(&stats_path).await.unwrap();
    let parsed: report::RunStats = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.files.len(), 2);
}
