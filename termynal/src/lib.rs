pub mod config;
pub mod document;
pub mod line;
pub mod parser;
pub mod render;

pub use config::{AnimationConfig, WidgetOptions};
pub use line::LineDescriptor;
pub use parser::{ParseError, Parser};

/// The animated form of one console block.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Line descriptors in source order.
    pub lines: Vec<LineDescriptor>,
    /// Non-fatal diagnostics raised while parsing.
    pub warnings: Vec<ParseError>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Parse standalone transcript text.
pub fn parse_transcript(text: &str) -> Transcript {
    Parser::new(text, 0).parse()
}
