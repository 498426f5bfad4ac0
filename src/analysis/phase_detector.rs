// Phase detection over free lesson text and phase assignment over decks
// Iterates the phase dictionary in its fixed array order so longer labels
// (`we-do-together`) are consumed before their shorter prefixes (`we-do`)

use anyhow::Result;
use regex_automata::{meta::Regex, Input};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase_patterns::PHASE_PATTERNS;
use super::Confidence;
use crate::deck::{LessonPhase, Slide};

/// One phase boundary found in source text.
/// Offsets are half-open byte positions into the analyzed string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPhase {
    pub phase: LessonPhase,
    pub confidence: Confidence,
    pub start: usize,
    pub end: usize,
}

struct CompiledPhase {
    phase: LessonPhase,
    structural: Vec<Regex>,
    content: Vec<Regex>,
}

/// Relative deck-index widths for the six canonical phases, used by the
/// positional heuristic when no explicit boundaries were detected.
/// Hook and plenary are short; the middle release stages carry the lesson.
const BUCKET_WEIGHTS: [f64; 6] = [0.08, 0.22, 0.15, 0.20, 0.25, 0.10];

/// Decks smaller than this get no heuristic phase assignment.
const HEURISTIC_MIN_SLIDES: usize = 5;

/// Detector that labels text spans and slides with pedagogical phases.
pub struct PhaseDetector {
    phases: Vec<CompiledPhase>,
}

impl PhaseDetector {
    /// Compile the phase dictionary, preserving its array order.
    pub fn new() -> Result<Self> {
        let mut phases = Vec::with_capacity(PHASE_PATTERNS.len());
        for spec in PHASE_PATTERNS {
            let structural = spec
                .structural
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<Vec<_>, _>>()?;
            let content = spec
                .content
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<Vec<_>, _>>()?;
            phases.push(CompiledPhase {
                phase: spec.phase,
                structural,
                content,
            });
        }
        Ok(Self { phases })
    }

    /// Find phase boundaries in free lesson text.
    ///
    /// Patterns are tried phase by phase in dictionary order, structural
    /// before content. Overlapping matches are resolved with the same
    /// precedence as content preservation: higher confidence wins, ties go
    /// to the earlier dictionary entry. Returns matches sorted by position.
    pub fn detect_phases_in_text(&self, text: &str) -> Vec<DetectedPhase> {
        struct Candidate {
            phase: LessonPhase,
            confidence: Confidence,
            start: usize,
            end: usize,
            dict_index: usize,
        }

        let mut candidates = Vec::new();
        for (dict_index, compiled) in self.phases.iter().enumerate() {
            for re in &compiled.structural {
                for m in re.find_iter(Input::new(text)) {
                    candidates.push(Candidate {
                        phase: compiled.phase,
                        confidence: Confidence::High,
                        start: m.start(),
                        end: m.end(),
                        dict_index,
                    });
                }
            }
            for re in &compiled.content {
                for m in re.find_iter(Input::new(text)) {
                    candidates.push(Candidate {
                        phase: compiled.phase,
                        confidence: Confidence::Medium,
                        start: m.start(),
                        end: m.end(),
                        dict_index,
                    });
                }
            }
        }

        // Precedence order: confidence, then dictionary position, then the
        // longer and earlier span. The dictionary tie-break is what keeps a
        // `we-do-together` span whole against the shorter `we-do` match.
        candidates.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then(a.dict_index.cmp(&b.dict_index))
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.start.cmp(&b.start))
        });

        let mut accepted: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            let overlaps = accepted
                .iter()
                .any(|kept| candidate.start < kept.end && kept.start < candidate.end);
            if !overlaps {
                accepted.push(candidate);
            }
        }
        accepted.sort_by_key(|c| (c.start, c.end));

        debug!("detected {} phase boundaries", accepted.len());
        accepted
            .into_iter()
            .map(|c| DetectedPhase {
                phase: c.phase,
                confidence: c.confidence,
                start: c.start,
                end: c.end,
            })
            .collect()
    }

    /// Assign a `lesson_phase` to each slide of a deck.
    ///
    /// Three mutually exclusive policies, tried in order: proportional
    /// mapping against explicit boundaries detected in the source text;
    /// positional heuristics for decks of at least five slides; otherwise
    /// no assignment. Slides that already carry a phase are never
    /// overwritten, and the input slice is never mutated.
    pub fn assign_phases_to_slides(
        &self,
        slides: &[Slide],
        detected: &[DetectedPhase],
        source_len: usize,
    ) -> Vec<Slide> {
        if !detected.is_empty() && source_len > 0 {
            self.assign_proportional(slides, detected, source_len)
        } else if slides.len() >= HEURISTIC_MIN_SLIDES {
            self.assign_positional(slides)
        } else {
            slides.to_vec()
        }
    }

    /// Policy 1: a slide at fractional deck position `p` takes the phase
    /// whose detected text range covers `p` in the source. The first
    /// detected phase extends back to the start of the text.
    fn assign_proportional(
        &self,
        slides: &[Slide],
        detected: &[DetectedPhase],
        source_len: usize,
    ) -> Vec<Slide> {
        let mut boundaries: Vec<(f64, LessonPhase)> = detected
            .iter()
            .map(|d| (d.start as f64 / source_len as f64, d.phase))
            .collect();
        boundaries.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = slides.len();
        slides
            .iter()
            .enumerate()
            .map(|(index, slide)| {
                let mut slide = slide.clone();
                if slide.lesson_phase.is_none() {
                    let p = (index as f64 + 0.5) / total as f64;
                    let phase = boundaries
                        .iter()
                        .rev()
                        .find(|(fraction, _)| *fraction <= p)
                        .map(|(_, phase)| *phase)
                        .unwrap_or(boundaries[0].1);
                    slide.lesson_phase = Some(phase);
                }
                slide
            })
            .collect()
    }

    /// Policy 2: partition the deck index range into six weighted buckets
    /// in canonical order, hook first and plenary last.
    fn assign_positional(&self, slides: &[Slide]) -> Vec<Slide> {
        let mut cumulative = [0.0f64; 6];
        let mut sum = 0.0;
        for (i, weight) in BUCKET_WEIGHTS.iter().enumerate() {
            sum += weight;
            cumulative[i] = sum;
        }

        let last = slides.len() - 1;
        slides
            .iter()
            .enumerate()
            .map(|(index, slide)| {
                let mut slide = slide.clone();
                if slide.lesson_phase.is_none() {
                    let p = index as f64 / last as f64;
                    let phase = cumulative
                        .iter()
                        .position(|boundary| p <= *boundary)
                        .map(|i| LessonPhase::ORDERED[i])
                        .unwrap_or(LessonPhase::Plenary);
                    slide.lesson_phase = Some(phase);
                }
                slide
            })
            .collect()
    }
}
