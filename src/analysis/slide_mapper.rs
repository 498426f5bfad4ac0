// Slide mapping: one day's scripted blocks into slides
// Accumulate-then-flush assembly with strict invariant enforcement: every
// emitted slide carries content.len() + 1 narration segments so the
// progressive-disclosure player never loses teleprompter sync.

use tracing::debug;

use super::scripted_parser::{ScriptResult, ScriptedBlock, ScriptedBlockKind, ScriptedDay};
use crate::deck::{LessonPhase, Slide, SlideContentItem, SlideKind};

/// Default minimum activity length, in characters, for promotion to a
/// dedicated work-together slide. Shorter activities fold into the open
/// slide as a bullet. Tunable; the right cutoff varies by class.
pub const ACTIVITY_SLIDE_MIN_CHARS: usize = 80;

/// Maps scripted blocks to slides.
pub struct SlideMapper {
    pub activity_slide_min_chars: usize,
}

impl SlideMapper {
    pub fn new() -> Self {
        Self {
            activity_slide_min_chars: ACTIVITY_SLIDE_MIN_CHARS,
        }
    }

    /// Override the dedicated-slide threshold for activity blocks.
    pub fn with_activity_threshold(mut self, chars: usize) -> Self {
        self.activity_slide_min_chars = chars;
        self
    }

    /// Convert one day's blocks into slides. Never mutates the input;
    /// always returns a valid (possibly empty) deck slice.
    pub fn map_day(&self, day: &ScriptedDay) -> Vec<Slide> {
        let default_title = day
            .title
            .clone()
            .unwrap_or_else(|| format!("Day {}", day.number));

        let mut slides = Vec::new();
        let mut builder = SlideBuilder::new(default_title.clone(), None);

        for block in &day.blocks {
            match block.kind {
                ScriptedBlockKind::SectionHeading => {
                    // A new section always starts a new slide.
                    builder.flush_into(&mut slides);
                    let phase = LessonPhase::from_heading_label(&block.text);
                    builder = SlideBuilder::new(block.text.clone(), phase);
                }
                ScriptedBlockKind::Say | ScriptedBlockKind::ImplicitSay => {
                    builder.push_narration(&block.text);
                }
                ScriptedBlockKind::WriteOnBoard => {
                    builder.push_bullet(SlideContentItem::bullet(block.text.clone()));
                }
                ScriptedBlockKind::Ask => {
                    // A question ends the slide so it gets dedicated
                    // screen time.
                    builder.push_bullet(SlideContentItem::question(block.text.clone()));
                    let successor = builder.successor();
                    builder.flush_into(&mut slides);
                    builder = successor;
                }
                ScriptedBlockKind::Activity => {
                    if block.text.chars().count() >= self.activity_slide_min_chars {
                        let successor = builder.successor();
                        let phase = builder.phase;
                        builder.flush_into(&mut slides);
                        slides.push(work_together_slide(block, phase));
                        builder = successor;
                    } else {
                        builder.push_bullet(SlideContentItem::bullet(block.text.clone()));
                    }
                }
            }
        }
        builder.flush_into(&mut slides);

        debug!(
            "mapped day {} ({} blocks) to {} slides",
            day.number,
            day.blocks.len(),
            slides.len()
        );
        slides
    }

    /// Convert a full parse result into one flat deck, day order preserved.
    pub fn map_script(&self, script: &ScriptResult) -> Vec<Slide> {
        script.days.iter().flat_map(|day| self.map_day(day)).collect()
    }
}

impl Default for SlideMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Slide under assembly. `narration[i]` is spoken before bullet `i` is
/// revealed; a trailing segment is spoken after the last bullet.
struct SlideBuilder {
    title: String,
    phase: Option<LessonPhase>,
    content: Vec<SlideContentItem>,
    narration: Vec<String>,
}

impl SlideBuilder {
    fn new(title: String, phase: Option<LessonPhase>) -> Self {
        Self {
            title,
            phase,
            content: Vec::new(),
            narration: Vec::new(),
        }
    }

    /// Fresh builder continuing the same section after a flush.
    fn successor(&self) -> Self {
        Self::new(self.title.clone(), self.phase)
    }

    fn push_narration(&mut self, text: &str) {
        let slot = self.content.len();
        while self.narration.len() <= slot {
            self.narration.push(String::new());
        }
        let segment = &mut self.narration[slot];
        if segment.is_empty() {
            segment.push_str(text);
        } else {
            // Consecutive narration between bullets merges into one segment.
            segment.push(' ');
            segment.push_str(text);
        }
    }

    fn push_bullet(&mut self, item: SlideContentItem) {
        self.content.push(item);
    }

    fn is_empty(&self) -> bool {
        self.content.is_empty() && self.narration.iter().all(|s| s.is_empty())
    }

    /// Emit the slide, padding narration with empty trailing segments until
    /// the segment count equals bullet count + 1. Bullets are never
    /// truncated to fit.
    fn flush_into(mut self, slides: &mut Vec<Slide>) {
        if self.is_empty() {
            return;
        }
        while self.narration.len() < self.content.len() + 1 {
            self.narration.push(String::new());
        }
        slides.push(Slide {
            title: self.title,
            content: self.content,
            speaker_notes: Slide::join_segments(&self.narration),
            lesson_phase: self.phase,
            kind: SlideKind::Content,
        });
    }
}

/// Substantial activities get their own slide rather than being folded
/// into the current one.
fn work_together_slide(block: &ScriptedBlock, phase: Option<LessonPhase>) -> Slide {
    let narration = vec![block.text.clone(), String::new()];
    Slide {
        title: "Work together".to_string(),
        content: vec![SlideContentItem::bullet(block.text.clone())],
        speaker_notes: Slide::join_segments(&narration),
        lesson_phase: phase,
        kind: SlideKind::WorkTogether,
    }
}
