// Content preservation detection over raw lesson-plan text
// Finds questions, activities, and instructions that must survive slide
// generation verbatim, so an AI rewriting step cannot paraphrase away a
// teacher's exact wording. Pure function of its input: identical text
// always yields byte-identical output (downstream prompt caching depends
// on stable ordering).

use anyhow::Result;
use regex_automata::{meta::Regex, Input};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::action_verbs::ActionVerbChecker;
use super::{Confidence, DetectionMethod};

/// Default character distance within which an answer is paired to its
/// question for teachable-moment detection.
pub const ANSWER_PROXIMITY_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Question,
    Activity,
    Instruction,
}

/// One span of teacher-authored text that must appear unmodified on slides.
///
/// Offsets are half-open byte positions into the exact input string passed
/// to detection, never a normalized copy, so highlighting stays in sync.
/// Invariant: `start < end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedContent {
    pub kind: ContentKind,
    /// Exact substring `input[start..end]`.
    pub text: String,
    pub confidence: Confidence,
    pub method: DetectionMethod,
    pub start: usize,
    pub end: usize,
}

impl DetectedContent {
    fn overlaps(&self, other: &DetectedContent) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Aggregate detection result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreservableContent {
    pub questions: Vec<DetectedContent>,
    pub activities: Vec<DetectedContent>,
    pub instructions: Vec<DetectedContent>,
    /// Union of the three, sorted ascending by `start`, no two overlapping.
    pub all: Vec<DetectedContent>,
}

/// Category assigned to a question/answer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentCategory {
    Computation,
    Vocabulary,
    Discussion,
    Recall,
}

/// A detected question or activity paired with its nearby answer.
///
/// The answer span is kept strictly outside the prompt span; pairs where
/// the answer would leak into the prompt's own text are discarded rather
/// than emitted (the presentation layer must never show an answer before
/// the teacher reveals it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachableMoment {
    pub prompt: DetectedContent,
    pub answer_text: String,
    pub answer_start: usize,
    pub answer_end: usize,
    pub category: MomentCategory,
}

/// Detector for preservable content spans.
pub struct PreservationDetector {
    question_label: Regex,
    numbered_question: Regex,
    instruction_prefix: Regex,
    answer_label: Regex,
    verbs: ActionVerbChecker,
    answer_proximity: usize,
}

impl PreservationDetector {
    pub fn new() -> Result<Self> {
        // Compositional pattern components
        let line_head = r"(?im)^[ \t]*";
        let question_labels = r"(?:ask|question(?: [0-9]+)?|quick check|discussion(?: question)?|q[0-9]+)";
        let instruction_labels =
            r"(?:instructions?|directions?|task|activity|homework|do now|your turn|practice)";
        let answer_labels = r"(?:answer|ans\.?|a)";

        let question_label = format!(r"{line_head}{question_labels}[ \t]*[:.][ \t]*");
        let instruction_prefix = format!(r"{line_head}{instruction_labels}[ \t]*:[ \t]*");
        let answer_label = format!(r"{line_head}{answer_labels}[ \t]*:[ \t]*");
        let numbered_question = r"(?m)^[ \t]*[0-9]+[.)][ \t]+[^\n]*\?[ \t]*\r?$";

        Ok(Self {
            question_label: Regex::new(&question_label)?,
            numbered_question: Regex::new(numbered_question)?,
            instruction_prefix: Regex::new(&instruction_prefix)?,
            answer_label: Regex::new(&answer_label)?,
            verbs: ActionVerbChecker::new(),
            answer_proximity: ANSWER_PROXIMITY_CHARS,
        })
    }

    /// Override the teachable-moment pairing distance.
    pub fn with_answer_proximity(mut self, chars: usize) -> Self {
        self.answer_proximity = chars;
        self
    }

    /// Scan lesson text for spans that must be preserved verbatim.
    pub fn detect(&self, text: &str) -> PreservableContent {
        debug!("starting preservation detection on {} bytes", text.len());

        let mut candidates = Vec::new();
        self.collect_punctuation_questions(text, &mut candidates);
        self.collect_labeled_questions(text, &mut candidates);
        self.collect_numbered_questions(text, &mut candidates);
        self.collect_action_verb_activities(text, &mut candidates);
        self.collect_instructions(text, &mut candidates);

        let all = resolve_overlaps(candidates);
        debug!("{} detections survived overlap resolution", all.len());

        let mut result = PreservableContent {
            all,
            ..PreservableContent::default()
        };
        for detection in &result.all {
            match detection.kind {
                ContentKind::Question => result.questions.push(detection.clone()),
                ContentKind::Activity => result.activities.push(detection.clone()),
                ContentKind::Instruction => result.instructions.push(detection.clone()),
            }
        }
        result
    }

    /// Pair detected questions/activities with nearby answers.
    pub fn detect_teachable_moments(&self, text: &str) -> Vec<TeachableMoment> {
        let preserved = self.detect(text);

        // Answer spans: remainder of each answer-labelled line.
        let answers: Vec<(usize, usize, usize)> = self
            .answer_label
            .find_iter(Input::new(text))
            .map(|m| {
                let end = line_end(text, m.end());
                let (start, end) = trim_span(text, m.end(), end);
                (m.start(), start, end)
            })
            .filter(|(_, start, end)| start < end)
            .collect();

        let mut moments = Vec::new();
        for prompt in preserved
            .all
            .iter()
            .filter(|d| matches!(d.kind, ContentKind::Question | ContentKind::Activity))
        {
            let paired = answers.iter().find(|(label_start, _, _)| {
                *label_start >= prompt.end && label_start - prompt.end <= self.answer_proximity
            });
            let Some(&(_, answer_start, answer_end)) = paired else {
                continue;
            };
            let answer_text = &text[answer_start..answer_end];
            if answer_leaks(prompt, answer_start, answer_text) {
                debug!(
                    "dropping teachable moment at {}..{}: answer would leak into prompt span",
                    prompt.start, prompt.end
                );
                continue;
            }
            moments.push(TeachableMoment {
                prompt: prompt.clone(),
                answer_text: answer_text.to_string(),
                answer_start,
                answer_end,
                category: classify_moment(&prompt.text),
            });
        }
        moments
    }

    /// Sentence-like spans ending in `?` are question candidates.
    fn collect_punctuation_questions(&self, text: &str, out: &mut Vec<DetectedContent>) {
        for (start, end) in sentence_spans(text) {
            let sentence = &text[start..end];
            if sentence.ends_with('?') && sentence.chars().any(|c| c.is_alphanumeric()) {
                out.push(DetectedContent {
                    kind: ContentKind::Question,
                    text: text[start..end].to_string(),
                    confidence: Confidence::Medium,
                    method: DetectionMethod::Punctuation,
                    start,
                    end,
                });
            }
        }
    }

    /// A recognized question label promotes the remainder of its line.
    fn collect_labeled_questions(&self, text: &str, out: &mut Vec<DetectedContent>) {
        for m in self.question_label.find_iter(Input::new(text)) {
            let end = line_end(text, m.end());
            let (start, end) = trim_span(text, m.end(), end);
            if start < end {
                out.push(DetectedContent {
                    kind: ContentKind::Question,
                    text: text[start..end].to_string(),
                    confidence: Confidence::High,
                    method: DetectionMethod::Context,
                    start,
                    end,
                });
            }
        }
    }

    /// Numbered question lines (`1. Why ...?`), grouped by the shared method.
    fn collect_numbered_questions(&self, text: &str, out: &mut Vec<DetectedContent>) {
        for m in self.numbered_question.find_iter(Input::new(text)) {
            let (start, end) = trim_span(text, m.start(), m.end());
            if start < end {
                out.push(DetectedContent {
                    kind: ContentKind::Question,
                    text: text[start..end].to_string(),
                    confidence: Confidence::Medium,
                    method: DetectionMethod::NumberedList,
                    start,
                    end,
                });
            }
        }
    }

    /// Sentences opening with a Bloom's-taxonomy action verb are activities.
    /// Confidence rises to high when an instruction marker precedes the
    /// sentence (its own line, or the nearest non-blank line above it).
    fn collect_action_verb_activities(&self, text: &str, out: &mut Vec<DetectedContent>) {
        for (start, end) in sentence_spans(text) {
            if !self.verbs.starts_with_action_verb(&text[start..end]) {
                continue;
            }
            let confidence = if self.preceded_by_instruction_marker(text, start) {
                Confidence::High
            } else {
                Confidence::Medium
            };
            out.push(DetectedContent {
                kind: ContentKind::Activity,
                text: text[start..end].to_string(),
                confidence,
                method: DetectionMethod::ActionVerb,
                start,
                end,
            });
        }
    }

    /// Lines opening with an instruction marker are preserved whole.
    fn collect_instructions(&self, text: &str, out: &mut Vec<DetectedContent>) {
        for m in self.instruction_prefix.find_iter(Input::new(text)) {
            let end = line_end(text, m.start());
            let (start, end) = trim_span(text, m.start(), end);
            if start < end {
                out.push(DetectedContent {
                    kind: ContentKind::Instruction,
                    text: text[start..end].to_string(),
                    confidence: Confidence::High,
                    method: DetectionMethod::InstructionPrefix,
                    start,
                    end,
                });
            }
        }
    }

    fn preceded_by_instruction_marker(&self, text: &str, sentence_start: usize) -> bool {
        let start = line_start(text, sentence_start);
        let line = &text[start..line_end(text, start)];
        if self.instruction_prefix.is_match(Input::new(line)) {
            return true;
        }
        // Walk upward to the nearest non-blank line.
        let mut cursor = start;
        while cursor > 0 {
            let newline = cursor - 1;
            let prev_start = line_start(text, newline);
            let prev = text[prev_start..newline].trim();
            if !prev.is_empty() {
                return self.instruction_prefix.is_match(Input::new(prev));
            }
            cursor = prev_start;
        }
        false
    }
}

/// Resolve overlapping detections: higher confidence wins, then the more
/// specific method, then the longer span, then the earlier one. Losers are
/// dropped whole, never truncated.
fn resolve_overlaps(mut candidates: Vec<DetectedContent>) -> Vec<DetectedContent> {
    candidates.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then(b.method.cmp(&a.method))
            .then((b.end - b.start).cmp(&(a.end - a.start)))
            .then(a.start.cmp(&b.start))
    });

    let mut accepted: Vec<DetectedContent> = Vec::new();
    for candidate in candidates {
        if accepted.iter().all(|kept| !kept.overlaps(&candidate)) {
            accepted.push(candidate);
        }
    }
    accepted.sort_by_key(|d| (d.start, d.end));
    accepted
}

/// True when pairing this answer with this prompt would expose the answer
/// early: either the spans overlap, or the answer text is reproduced inside
/// the prompt's own returned text.
fn answer_leaks(prompt: &DetectedContent, answer_start: usize, answer_text: &str) -> bool {
    if answer_start < prompt.end {
        return true;
    }
    !answer_text.is_empty() && prompt.text.contains(answer_text)
}

fn classify_moment(prompt_text: &str) -> MomentCategory {
    let lower = prompt_text.to_ascii_lowercase();
    let has_operator = lower
        .chars()
        .any(|c| matches!(c, '+' | '=' | '×' | '÷' | '/' | '%'));
    if lower.chars().any(|c| c.is_ascii_digit()) || has_operator {
        MomentCategory::Computation
    } else if lower.contains(" mean") || lower.contains("define") || lower.contains("definition") {
        MomentCategory::Vocabulary
    } else if lower.starts_with("why") || lower.starts_with("how") || lower.contains("do you think")
    {
        MomentCategory::Discussion
    } else {
        MomentCategory::Recall
    }
}

/// Sentence-like spans, trimmed, terminator included.
/// Splits on `.`, `!`, `?`, and line breaks; a period between digits does
/// not split (decimal numbers stay whole).
fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut sent_start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'.' if i > 0
                && i + 1 < bytes.len()
                && bytes[i - 1].is_ascii_digit()
                && bytes[i + 1].is_ascii_digit() => {}
            b'.' | b'!' | b'?' => {
                push_trimmed(text, sent_start, i + 1, &mut spans);
                sent_start = i + 1;
            }
            b'\n' => {
                push_trimmed(text, sent_start, i, &mut spans);
                sent_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    push_trimmed(text, sent_start, text.len(), &mut spans);
    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    let (start, end) = trim_span(text, start, end);
    if start < end {
        spans.push((start, end));
    }
}

/// Shrink a span to exclude leading/trailing whitespace.
fn trim_span(text: &str, start: usize, end: usize) -> (usize, usize) {
    if start >= end {
        return (start, start);
    }
    let slice = &text[start..end];
    let trimmed = slice.trim_start();
    let lead = slice.len() - trimmed.len();
    let trimmed = trimmed.trim_end();
    (start + lead, start + lead + trimmed.len())
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..]
        .find('\n')
        .map(|i| from + i)
        .unwrap_or(text.len())
}
