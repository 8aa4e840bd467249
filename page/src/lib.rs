pub mod animation;
pub mod layout;

pub use animation::{Animation, Termynal};
pub use layout::{Layout, LineLayout, Viewport};

use termynal::document;
use termynal::{AnimationConfig, ParseError};

/// Animations created for a page that have not started yet.
///
/// The page owns its pending set; each visibility check starts what has
/// scrolled into view and hands those animations back to the caller.
#[derive(Debug)]
pub struct Page<A> {
    pending: Vec<A>,
}

impl<A: Animation> Page<A> {
    pub fn new() -> Self {
        Page {
            pending: Vec::new(),
        }
    }

    /// Keep an animation until its container becomes visible.
    pub fn retain(&mut self, animation: A) {
        self.pending.push(animation);
    }

    pub fn pending(&self) -> &[A] {
        &self.pending
    }

    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Start every pending animation revealed by `viewport`, in page order.
    /// Started animations leave the pending set and are returned.
    pub fn load_visible(&mut self, viewport: &Viewport) -> Vec<A> {
        let (mut visible, hidden): (Vec<A>, Vec<A>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|a| viewport.reveals(a.container_top()));
        self.pending = hidden;
        for animation in &mut visible {
            animation.init();
        }
        visible
    }
}

impl<A: Animation> Default for Page<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl Page<Termynal> {
    /// Create one animation per console block in a Markdown document, in
    /// document order. Parse warnings from every block are returned.
    pub fn from_document<S: AsRef<str>>(
        source: &str,
        file_id: usize,
        languages: &[S],
        config: AnimationConfig,
        layout: &impl Layout,
    ) -> (Self, Vec<ParseError>) {
        let mut page = Page::new();
        let mut warnings = Vec::new();
        for (id, block) in document::scan(source, languages).iter().enumerate() {
            let mut transcript = block.transcript(file_id);
            warnings.append(&mut transcript.warnings);
            let termynal = Termynal::new(
                id,
                transcript.lines,
                config,
                layout.top_of(source, block),
            );
            if termynal.is_started() {
                continue;
            }
            page.retain(termynal);
        }
        (page, warnings)
    }
}
