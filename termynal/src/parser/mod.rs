pub mod error;
pub mod rules;

pub use error::{ParseError, ParseErrorKind};

use std::ops::Range;

use crate::Transcript;
use crate::line::{LINE_BREAK, LineDescriptor};
use rules::Classification;

/// Transcript parser entry point.
///
/// `offset` is the position of `source` inside the file identified by
/// `file_id`, so that diagnostic spans point into the whole document.
pub struct Parser<'a> {
    source: &'a str,
    file_id: usize,
    offset: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            offset: 0,
        }
    }

    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Parse the block text into a transcript. Never fails; malformed lines
    /// are reported as warnings on the result.
    pub fn parse(&self) -> Transcript {
        split_lines(self.source, self.offset)
            .into_iter()
            .fold(Fold::new(self.file_id), Fold::step)
            .finish()
    }
}

/// Split on `\n`, dropping one trailing empty line. Each line comes with its
/// byte span.
pub fn split_lines(source: &str, offset: usize) -> Vec<(Range<usize>, &str)> {
    let mut lines = Vec::new();
    let mut start = offset;
    for line in source.split('\n') {
        lines.push((start..start + line.len(), line));
        start += line.len() + 1;
    }
    if lines.last().is_some_and(|(_, line)| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Collapse a run of plain lines into one output descriptor.
///
/// An all-empty run gets `delay: 0`. A run ending in an empty line gets one
/// more, since a single trailing break is not rendered.
pub fn collapse_output(run: &[&str]) -> Option<LineDescriptor> {
    let last = run.last()?;
    let is_blank_space = run.iter().all(|line| line.is_empty());
    let mut value = run.join(LINE_BREAK);
    if last.is_empty() {
        value.push_str(LINE_BREAK);
    }
    Some(LineDescriptor::Output {
        value,
        delay: is_blank_space.then_some(0),
    })
}

/// Fold state: pending plain lines plus everything emitted so far.
struct Fold<'s> {
    file_id: usize,
    buffer: Vec<&'s str>,
    lines: Vec<LineDescriptor>,
    warnings: Vec<ParseError>,
}

impl<'s> Fold<'s> {
    fn new(file_id: usize) -> Self {
        Fold {
            file_id,
            buffer: Vec::new(),
            lines: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn step(mut self, (span, line): (Range<usize>, &'s str)) -> Self {
        let Some((rule, classification)) = rules::classify(line) else {
            self.buffer.push(line);
            return self;
        };

        self.flush();
        match classification {
            Classification::Emit(descriptor) => self.lines.push(descriptor),
            Classification::Malformed => {
                tracing::warn!(rule, line, "custom prompt found but no end delimiter");
                self.warnings
                    .push(ParseError::malformed_annotation(line, span, self.file_id));
            }
        }
        self
    }

    fn flush(&mut self) {
        if let Some(output) = collapse_output(&self.buffer) {
            self.lines.push(output);
        }
        self.buffer.clear();
    }

    fn finish(mut self) -> Transcript {
        self.flush();
        Transcript {
            lines: self.lines,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_only_one_trailing_empty_line() {
        let lines: Vec<&str> = split_lines("a\nb\n", 0).into_iter().map(|(_, l)| l).collect();
        assert_eq!(lines, vec!["a", "b"]);

        let lines: Vec<&str> = split_lines("a\n\n", 0).into_iter().map(|(_, l)| l).collect();
        assert_eq!(lines, vec!["a", ""]);

        assert!(split_lines("", 0).is_empty());
    }

    #[test]
    fn split_spans_include_offset() {
        let spans: Vec<Range<usize>> =
            split_lines("ab\ncd", 10).into_iter().map(|(s, _)| s).collect();
        assert_eq!(spans, vec![10..12, 13..15]);
    }

    #[test]
    fn collapse_pads_trailing_blank() {
        assert_eq!(
            collapse_output(&["a", ""]),
            Some(LineDescriptor::Output {
                value: "a<br><br>".into(),
                delay: None,
            })
        );
    }

    #[test]
    fn collapse_blank_run_has_zero_delay() {
        assert_eq!(
            collapse_output(&["", ""]),
            Some(LineDescriptor::Output {
                value: "<br><br>".into(),
                delay: Some(0),
            })
        );
    }

    #[test]
    fn collapse_empty_run_is_nothing() {
        assert_eq!(collapse_output(&[]), None);
    }

    #[test]
    fn malformed_span_points_at_the_line() {
        let transcript = Parser::new("ok\n# root ls", 3).at_offset(100).parse();
        assert_eq!(transcript.warnings.len(), 1);
        assert_eq!(transcript.warnings[0].span, 103..112);
        assert_eq!(transcript.warnings[0].file_id, 3);
    }
}
