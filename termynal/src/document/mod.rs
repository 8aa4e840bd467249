use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::Transcript;
use crate::parser::Parser;

/// Fence info string that marks a console block unless configured otherwise.
pub const DEFAULT_LANGUAGE: &str = "console";

pub(crate) const OPTIONS: Options = Options::ENABLE_STRIKETHROUGH.union(Options::ENABLE_TABLES);

/// A fenced code block whose text is an animated console transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleBlock {
    pub language: String,
    pub content: String,
    /// Byte offset of `content` in the document.
    pub content_offset: usize,
    /// Byte span of the whole fence in the document.
    pub span: Range<usize>,
}

impl ConsoleBlock {
    pub fn transcript(&self, file_id: usize) -> Transcript {
        Parser::new(&self.content, file_id)
            .at_offset(self.content_offset)
            .parse()
    }
}

/// Find console blocks in Markdown source, in document order.
///
/// A fenced block qualifies when the first word of its info string is one of
/// `languages`. Indented blocks never do.
pub fn scan<S: AsRef<str>>(source: &str, languages: &[S]) -> Vec<ConsoleBlock> {
    let events: Vec<(Event<'_>, Range<usize>)> =
        CmarkParser::new_ext(source, OPTIONS).into_offset_iter().collect();

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < events.len() {
        let (ref ev, ref range) = events[i];
        i += 1;
        let Some(language) = console_language(ev, languages) else {
            continue;
        };

        let (content, content_offset, end) = collect_code(&events, &mut i, range.start);
        tracing::debug!(language, offset = range.start, "found console block");
        blocks.push(ConsoleBlock {
            language: language.to_string(),
            content,
            content_offset,
            span: range.start..end.max(range.end),
        });
    }
    blocks
}

/// The block's language, if `ev` opens a fenced block in one of `languages`.
pub(crate) fn console_language<'e, S: AsRef<str>>(
    ev: &'e Event<'_>,
    languages: &[S],
) -> Option<&'e str> {
    let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = ev else {
        return None;
    };
    let language = info.split_whitespace().next()?;
    languages
        .iter()
        .any(|l| l.as_ref() == language)
        .then_some(language)
}

/// Collect code text until End(CodeBlock). Returns the text, the offset of
/// its first byte, and the end of the block.
pub(crate) fn collect_code(
    events: &[(Event<'_>, Range<usize>)],
    i: &mut usize,
    block_start: usize,
) -> (String, usize, usize) {
    let mut text = String::new();
    let mut offset = None;
    let mut end = block_start;
    while *i < events.len() {
        let (ref ev, ref range) = events[*i];
        *i += 1;
        match ev {
            Event::End(TagEnd::CodeBlock) => {
                end = range.end;
                break;
            }
            Event::Text(s) => {
                offset.get_or_insert(range.start);
                text.push_str(s);
            }
            _ => {}
        }
    }
    (text, offset.unwrap_or(block_start), end)
}

/// Convert a byte offset in `source` to a 1-based line number.
pub fn line_number(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Install\n\n```console\n?> pip install x\n---> 100%\n```\n\n```python\nprint(1)\n```\n\n```console title=\"x\"\n// done\n```\n";

    #[test]
    fn finds_console_blocks_in_order() {
        let blocks = scan(DOC, &[DEFAULT_LANGUAGE]);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, "?> pip install x\n---> 100%\n");
        assert_eq!(blocks[1].content, "// done\n");
    }

    #[test]
    fn content_offset_points_into_source() {
        let blocks = scan(DOC, &[DEFAULT_LANGUAGE]);
        let block = &blocks[0];
        assert_eq!(
            &DOC[block.content_offset..block.content_offset + 3],
            "?> "
        );
        assert_eq!(line_number(DOC, block.content_offset), 4);
        assert_eq!(line_number(DOC, block.span.start), 3);
    }

    #[test]
    fn language_list_is_configurable() {
        let blocks = scan(DOC, &["python"]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, "python");
        assert!(scan(DOC, &["shell"]).is_empty());
    }

    #[test]
    fn indented_blocks_are_ignored() {
        assert!(scan("para\n\n    ?> ls\n", &[DEFAULT_LANGUAGE]).is_empty());
    }

    #[test]
    fn empty_block_has_no_lines() {
        let blocks = scan("```console\n```\n", &[DEFAULT_LANGUAGE]);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].transcript(0).is_empty());
    }
}
