// Scripted lesson parsing: marker-annotated text into typed blocks
// Single forward pass over lines with an explicit cursor (current day,
// current section, open block). Malformed input degrades to warnings and
// skipped-line counts; this parser never returns an error.

use anyhow::Result;
use regex_automata::{meta::Regex, Input};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unmarked prose lines shorter than this are treated as noise rather than
/// implicit narration, so stray heading fragments don't become Say blocks.
pub const IMPLICIT_SAY_MIN_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptedBlockKind {
    Say,
    Ask,
    WriteOnBoard,
    Activity,
    SectionHeading,
    ImplicitSay,
}

/// One parsed unit of scripted lesson text.
/// Created once during the scan, immutable afterwards, consumed exactly
/// once by the slide mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedBlock {
    pub kind: ScriptedBlockKind,
    pub text: String,
    /// Day number active when the block was parsed.
    pub day: u32,
    /// Section heading active when the block was parsed, as authored.
    pub section: Option<String>,
}

/// One `## Day N` group of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedDay {
    pub number: u32,
    pub title: Option<String>,
    pub blocks: Vec<ScriptedBlock>,
}

/// Aggregate parse statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    pub total_lines: usize,
    pub parsed_lines: usize,
    pub skipped_lines: usize,
    pub say_blocks: usize,
    pub ask_blocks: usize,
    pub board_blocks: usize,
    pub activity_blocks: usize,
    pub heading_blocks: usize,
    pub implicit_say_blocks: usize,
    pub total_days: usize,
}

/// Complete parse result. Structurally valid even for degenerate input:
/// empty text yields no days and `total_days == 0`, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResult {
    pub days: Vec<ScriptedDay>,
    pub stats: ParseStats,
    pub warnings: Vec<String>,
}

/// Parser for marker-annotated lesson text.
pub struct ScriptedParser {
    marker: Regex,
    day_heading: Regex,
    section_heading: Regex,
}

/// Block being accumulated while its continuation lines arrive.
struct OpenBlock {
    kind: ScriptedBlockKind,
    text: String,
}

/// Day group being accumulated.
struct OpenDay {
    number: u32,
    title: Option<String>,
    explicit: bool,
    blocks: Vec<ScriptedBlock>,
}

impl OpenDay {
    fn implicit_first() -> Self {
        Self {
            number: 1,
            title: None,
            explicit: false,
            blocks: Vec::new(),
        }
    }
}

/// Scan state: the implicit state machine made explicit.
struct Cursor {
    day: OpenDay,
    section: Option<String>,
    open_block: Option<OpenBlock>,
}

impl ScriptedParser {
    pub fn new() -> Result<Self> {
        let marker = r"(?i)^[ \t]*(?:say|ask|write[ \t]+on[ \t]+board|activity)[ \t]*:[ \t]*";
        let day_heading = r"(?i)^[ \t]*#{1,3}[ \t]*day[ \t]+[0-9]+";
        let section_heading = r"^[ \t]*#{2,3}[ \t]+";
        Ok(Self {
            marker: Regex::new(marker)?,
            day_heading: Regex::new(day_heading)?,
            section_heading: Regex::new(section_heading)?,
        })
    }

    /// Parse marker-annotated lesson text into day groups of blocks.
    pub fn parse(&self, text: &str) -> ScriptResult {
        debug!("starting scripted parse of {} bytes", text.len());

        let mut result = ScriptResult::default();
        let mut cursor = Cursor {
            day: OpenDay::implicit_first(),
            section: None,
            open_block: None,
        };

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            result.stats.total_lines += 1;
            let line = raw_line.trim();

            if line.is_empty() {
                self.close_block(&mut cursor, &mut result.stats);
                continue;
            }

            if let Some(m) = self.day_heading.find(Input::new(raw_line)) {
                self.close_block(&mut cursor, &mut result.stats);
                let matched = &raw_line[m.start()..m.end()];
                let number = trailing_number(matched);
                let title = day_title(&raw_line[m.end()..]);
                match number {
                    Some(number) => {
                        self.close_day(&mut cursor, &mut result.days, Some((number, title)));
                        result.stats.parsed_lines += 1;
                    }
                    None => {
                        // Day index too large to be real; treat as noise.
                        result
                            .warnings
                            .push(format!("line {line_no}: unusable day number in {line:?}"));
                        result.stats.skipped_lines += 1;
                    }
                }
                continue;
            }

            if let Some(m) = self.section_heading.find(Input::new(raw_line)) {
                self.close_block(&mut cursor, &mut result.stats);
                let label = raw_line[m.end()..].trim();
                if crate::deck::LessonPhase::from_heading_label(label).is_some() {
                    cursor.section = Some(label.to_string());
                    self.emit(
                        &mut cursor,
                        ScriptedBlockKind::SectionHeading,
                        label.to_string(),
                        &mut result.stats,
                    );
                    result.stats.parsed_lines += 1;
                } else {
                    // Headings outside the phase vocabulary close the
                    // current block and section but produce no block.
                    cursor.section = None;
                    result
                        .warnings
                        .push(format!("line {line_no}: heading {label:?} is not a phase name"));
                    result.stats.skipped_lines += 1;
                }
                continue;
            }

            if let Some(m) = self.marker.find(Input::new(raw_line)) {
                self.close_block(&mut cursor, &mut result.stats);
                let kind = marker_kind(&raw_line[m.start()..m.end()]);
                cursor.open_block = Some(OpenBlock {
                    kind,
                    text: raw_line[m.end()..].trim().to_string(),
                });
                result.stats.parsed_lines += 1;
                continue;
            }

            // Unmarked line: continuation of an open marker block, implicit
            // narration, or noise.
            if let Some(block) = cursor.open_block.as_mut() {
                if !block.text.is_empty() {
                    block.text.push(' ');
                }
                block.text.push_str(line);
                result.stats.parsed_lines += 1;
            } else if line.chars().count() >= IMPLICIT_SAY_MIN_CHARS {
                self.emit(
                    &mut cursor,
                    ScriptedBlockKind::ImplicitSay,
                    line.to_string(),
                    &mut result.stats,
                );
                result.stats.parsed_lines += 1;
            } else {
                result.stats.skipped_lines += 1;
                if looks_like_marker(line) {
                    result
                        .warnings
                        .push(format!("line {line_no}: {line:?} looks like an unrecognized marker"));
                }
            }
        }

        self.close_block(&mut cursor, &mut result.stats);
        self.close_day(&mut cursor, &mut result.days, None);
        result.stats.total_days = result.days.len();

        debug!(
            "scripted parse complete: {} days, {} warnings",
            result.stats.total_days,
            result.warnings.len()
        );
        result
    }

    /// Move the open block, if any, into the current day.
    fn close_block(&self, cursor: &mut Cursor, stats: &mut ParseStats) {
        if let Some(block) = cursor.open_block.take() {
            if block.text.is_empty() {
                // Marker with no payload on any line; drop it.
                return;
            }
            self.emit(cursor, block.kind, block.text, stats);
        }
    }

    fn emit(
        &self,
        cursor: &mut Cursor,
        kind: ScriptedBlockKind,
        text: String,
        stats: &mut ParseStats,
    ) {
        match kind {
            ScriptedBlockKind::Say => stats.say_blocks += 1,
            ScriptedBlockKind::Ask => stats.ask_blocks += 1,
            ScriptedBlockKind::WriteOnBoard => stats.board_blocks += 1,
            ScriptedBlockKind::Activity => stats.activity_blocks += 1,
            ScriptedBlockKind::SectionHeading => stats.heading_blocks += 1,
            ScriptedBlockKind::ImplicitSay => stats.implicit_say_blocks += 1,
        }
        cursor.day.blocks.push(ScriptedBlock {
            kind,
            text,
            day: cursor.day.number,
            section: cursor.section.clone(),
        });
    }

    /// Finish the current day group and start the next one.
    /// `next` is `None` at end of input.
    fn close_day(
        &self,
        cursor: &mut Cursor,
        days: &mut Vec<ScriptedDay>,
        next: Option<(u32, Option<String>)>,
    ) {
        let next_day = match next {
            Some((number, title)) => OpenDay {
                number,
                title,
                explicit: true,
                blocks: Vec::new(),
            },
            None => OpenDay::implicit_first(),
        };
        let finished = std::mem::replace(&mut cursor.day, next_day);
        if finished.explicit || !finished.blocks.is_empty() {
            days.push(ScriptedDay {
                number: finished.number,
                title: finished.title,
                blocks: finished.blocks,
            });
        }
        // A day boundary resets the section context.
        cursor.section = None;
    }
}

fn marker_kind(matched: &str) -> ScriptedBlockKind {
    let lower = matched.trim().to_ascii_lowercase();
    if lower.starts_with("say") {
        ScriptedBlockKind::Say
    } else if lower.starts_with("ask") {
        ScriptedBlockKind::Ask
    } else if lower.starts_with("write") {
        ScriptedBlockKind::WriteOnBoard
    } else {
        ScriptedBlockKind::Activity
    }
}

/// Digits at the end of a day-heading match.
fn trailing_number(matched: &str) -> Option<u32> {
    let digits: String = matched
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// Optional `: Title` remainder after a day heading.
fn day_title(rest: &str) -> Option<String> {
    let title = rest.trim().trim_start_matches(':').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Short unmarked lines with an early colon read like misspelled markers.
fn looks_like_marker(line: &str) -> bool {
    match line.find(':') {
        Some(pos) => pos > 0 && pos <= 15 && line[..pos].chars().all(|c| c.is_alphabetic() || c == ' '),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ScriptedParser {
        ScriptedParser::new().expect("parser construction should succeed")
    }

    #[test]
    fn test_single_day_marker_sequence() {
        let p = parser();
        let text = "## Day 1\nSay: Welcome everyone.\nAsk: What is gravity?\nWrite on board: gravity = force";
        let result = p.parse(text);

        assert_eq!(result.stats.total_days, 1);
        let day = &result.days[0];
        assert_eq!(day.number, 1);
        let kinds: Vec<ScriptedBlockKind> = day.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ScriptedBlockKind::Say,
                ScriptedBlockKind::Ask,
                ScriptedBlockKind::WriteOnBoard,
            ]
        );
        assert_eq!(day.blocks[0].text, "Welcome everyone.");
        assert_eq!(day.blocks[1].text, "What is gravity?");
        assert_eq!(day.blocks[2].text, "gravity = force");
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let p = parser();
        let result = p.parse("SAY: hello there class\nwrite ON board: the water cycle");

        let kinds: Vec<ScriptedBlockKind> =
            result.days[0].blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![ScriptedBlockKind::Say, ScriptedBlockKind::WriteOnBoard]
        );
    }

    #[test]
    fn test_block_continues_until_blank_line() {
        let p = parser();
        let text = "Say: The river carries silt\ndownstream to the delta\n\nSay: Next point.";
        let result = p.parse(text);

        let blocks = &result.days[0].blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "The river carries silt downstream to the delta");
        assert_eq!(blocks[1].text, "Next point.");
    }

    #[test]
    fn test_block_closed_by_next_marker_and_heading() {
        let p = parser();
        let text = "Say: First point\nAsk: And then?\n## Hook\nSay: After the heading";
        let result = p.parse(text);

        let kinds: Vec<ScriptedBlockKind> =
            result.days[0].blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ScriptedBlockKind::Say,
                ScriptedBlockKind::Ask,
                ScriptedBlockKind::SectionHeading,
                ScriptedBlockKind::Say,
            ]
        );
    }

    #[test]
    fn test_day_boundaries_create_independent_groups() {
        let p = parser();
        let text = "## Day 1: Rivers\nSay: Day one narration here.\n## Day 2\nSay: Day two narration here.";
        let result = p.parse(text);

        assert_eq!(result.stats.total_days, 2);
        assert_eq!(result.days[0].number, 1);
        assert_eq!(result.days[0].title.as_deref(), Some("Rivers"));
        assert_eq!(result.days[1].number, 2);
        assert_eq!(result.days[1].title, None);
        assert_eq!(result.days[0].blocks.len(), 1);
        assert_eq!(result.days[1].blocks.len(), 1);
        assert_eq!(result.days[1].blocks[0].day, 2);
    }

    #[test]
    fn test_section_heading_sets_context() {
        let p = parser();
        let text = "## Hook\nSay: Look at this photograph.\n## You Do\nAsk: What do you notice?";
        let result = p.parse(text);

        let blocks = &result.days[0].blocks;
        assert_eq!(blocks[1].section.as_deref(), Some("Hook"));
        assert_eq!(blocks[3].section.as_deref(), Some("You Do"));
    }

    #[test]
    fn test_unknown_heading_warns_and_clears_section() {
        let p = parser();
        let text = "## Hook\nSay: Intro narration goes here.\n## Materials\nSay: More narration for the class.";
        let result = p.parse(text);

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Materials"));
        let last = result.days[0].blocks.last().unwrap();
        assert_eq!(last.section, None);
    }

    #[test]
    fn test_implicit_say_for_long_unmarked_prose() {
        let p = parser();
        let text = "Teachers often forget markers for plain narration lines.";
        let result = p.parse(text);

        assert_eq!(result.stats.total_days, 1);
        let blocks = &result.days[0].blocks;
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, ScriptedBlockKind::ImplicitSay);
        assert_eq!(result.stats.implicit_say_blocks, 1);
    }

    #[test]
    fn test_short_unmarked_lines_are_noise() {
        let p = parser();
        let result = p.parse("stray label\n\nanother");

        assert_eq!(result.stats.total_days, 0);
        assert!(result.days.is_empty());
        assert_eq!(result.stats.skipped_lines, 2);
    }

    #[test]
    fn test_misspelled_marker_warning() {
        let p = parser();
        let result = p.parse("Sey: oops\n");

        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("unrecognized marker")));
    }

    #[test]
    fn test_degenerate_input_never_errors() {
        let p = parser();
        for text in ["", "\n\n\n", "   ", "???", "Say:"] {
            let result = p.parse(text);
            assert_eq!(
                result.stats.total_days,
                result.days.len(),
                "input: {text:?}"
            );
        }
    }

    #[test]
    fn test_empty_input_yields_zero_days() {
        let p = parser();
        let result = p.parse("");

        assert_eq!(result.stats.total_days, 0);
        assert!(result.days.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_explicit_day_with_no_blocks_still_counts() {
        let p = parser();
        let result = p.parse("## Day 1");

        assert_eq!(result.stats.total_days, 1);
        assert!(result.days[0].blocks.is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let p = parser();
        let text = "## Day 1\nSay: hello class of mine\nmystery\nAsk: ready to learn today?";
        assert_eq!(p.parse(text), p.parse(text));
    }

    #[test]
    fn test_stats_line_accounting() {
        let p = parser();
        let text = "## Day 1\nSay: hello there everyone\n\nshort\n";
        let result = p.parse(text);

        assert_eq!(result.stats.total_lines, 4);
        assert_eq!(result.stats.parsed_lines, 2);
        assert_eq!(result.stats.skipped_lines, 1);
    }

    #[test]
    fn test_marker_with_no_payload_is_dropped() {
        let p = parser();
        let result = p.parse("Say:\n\nSay: real narration for the class");

        let blocks = &result.days[0].blocks;
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "real narration for the class");
    }
}
