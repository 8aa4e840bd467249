use termynal::document::{ConsoleBlock, line_number};

/// The visible window onto the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Document offset of the viewport's top edge.
    pub scroll_y: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(scroll_y: f64, height: f64) -> Self {
        Viewport { scroll_y, height }
    }

    /// Whether a container whose top edge sits at `top` has scrolled into
    /// view. Containers above the viewport count as visible.
    pub fn reveals(&self, top: f64) -> bool {
        top - self.scroll_y - self.height <= 0.0
    }
}

/// Places console block containers on the page.
pub trait Layout {
    fn top_of(&self, source: &str, block: &ConsoleBlock) -> f64;
}

/// Every source line takes the same vertical space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLayout {
    pub line_height: f64,
}

impl LineLayout {
    pub fn new(line_height: f64) -> Self {
        LineLayout { line_height }
    }
}

impl Default for LineLayout {
    fn default() -> Self {
        LineLayout { line_height: 24.0 }
    }
}

impl Layout for LineLayout {
    fn top_of(&self, source: &str, block: &ConsoleBlock) -> f64 {
        (line_number(source, block.span.start) - 1) as f64 * self.line_height
    }
}
