// Integration coverage for content preservation detection
// Exercises the public API the way the prompt-building collaborator does:
// detect spans over realistic lesson text, then rely on ordering and
// offset stability.

use chalkline::analysis::{
    Confidence, ContentKind, DetectionMethod, MomentCategory, PreservationDetector,
};

const FRACTIONS_LESSON: &str = "\
Today we are looking at fractions of amounts.

Ask: What is 3/4 of 12?
Answer: 9

Check for understanding:
1. What is 1/2 of 18?
2. What is 1/3 of 15?

Task: complete the fraction wall worksheet.
Compare your answers with a partner. How did you work them out?
";

fn detector() -> PreservationDetector {
    PreservationDetector::new().expect("detector construction should succeed")
}

#[test]
fn test_context_question_scenario() {
    let d = detector();
    let result = d.detect("Ask: What is 3/4 of 12?");

    assert_eq!(result.all.len(), 1);
    let q = &result.all[0];
    assert_eq!(q.kind, ContentKind::Question);
    assert_eq!(q.text, "What is 3/4 of 12?");
    assert_eq!(q.confidence, Confidence::High);
    assert_eq!(q.method, DetectionMethod::Context);
}

#[test]
fn test_mixed_lesson_finds_all_categories() {
    let d = detector();
    let result = d.detect(FRACTIONS_LESSON);

    assert!(!result.questions.is_empty(), "questions should be found");
    assert!(!result.activities.is_empty(), "activities should be found");
    assert!(!result.instructions.is_empty(), "instructions should be found");

    // The labelled question wins over the bare punctuation scan.
    let labelled = result
        .questions
        .iter()
        .find(|q| q.text == "What is 3/4 of 12?")
        .expect("labelled question should survive overlap resolution");
    assert_eq!(labelled.method, DetectionMethod::Context);

    // Both numbered questions are captured with the shared method.
    let numbered: Vec<_> = result
        .questions
        .iter()
        .filter(|q| q.method == DetectionMethod::NumberedList)
        .collect();
    assert_eq!(numbered.len(), 2);

    // The instruction line is preserved whole.
    assert!(result
        .instructions
        .iter()
        .any(|i| i.text.starts_with("Task:")));
}

#[test]
fn test_all_spans_sorted_non_overlapping_and_exact() {
    let d = detector();
    let result = d.detect(FRACTIONS_LESSON);

    for detection in &result.all {
        assert!(detection.start < detection.end);
        assert_eq!(
            &FRACTIONS_LESSON[detection.start..detection.end],
            detection.text,
            "span text must be the exact input substring"
        );
    }
    for pair in result.all.windows(2) {
        assert!(pair[0].start <= pair[1].start, "sorted ascending by start");
        assert!(pair[0].end <= pair[1].start, "no overlapping ranges");
    }
}

#[test]
fn test_repeated_detection_is_byte_identical() {
    let d = detector();
    let first = d.detect(FRACTIONS_LESSON);
    let second = d.detect(FRACTIONS_LESSON);
    assert_eq!(first, second);

    let serialized_first = serde_json::to_string(&first).unwrap();
    let serialized_second = serde_json::to_string(&second).unwrap();
    assert_eq!(serialized_first, serialized_second);
}

#[test]
fn test_teachable_moment_never_leaks_answer() {
    let d = detector();
    let moments = d.detect_teachable_moments(FRACTIONS_LESSON);

    let moment = moments
        .iter()
        .find(|m| m.prompt.text == "What is 3/4 of 12?")
        .expect("labelled question should pair with its answer");
    assert_eq!(moment.answer_text, "9");
    assert_eq!(moment.category, MomentCategory::Computation);

    for m in &moments {
        assert!(
            m.answer_start >= m.prompt.end,
            "answer span must sit outside the prompt span"
        );
        assert!(
            !m.prompt.text.contains(&m.answer_text),
            "answer text must not appear in the prompt text"
        );
    }
}

#[test]
fn test_adversarial_text_degrades_without_panicking() {
    let d = detector();
    let adversarial = [
        "????",
        ":::::\n:::\n:",
        "1.\n2.\n3.",
        "Ask:\nAnswer:",
        "Say: \u{201C}smart quotes\u{201D} and émojis 🦀 everywhere?",
        &"?".repeat(5000),
    ];
    for text in adversarial {
        let result = d.detect(text);
        for detection in &result.all {
            assert!(detection.start < detection.end);
            assert_eq!(&text[detection.start..detection.end], detection.text);
        }
    }
}
