use termynal::{AnimationConfig, LineDescriptor};

/// A created but possibly not yet started animation.
pub trait Animation {
    /// Top edge of the animation's container, in document coordinates.
    fn container_top(&self) -> f64;

    /// Start the animation.
    fn init(&mut self);
}

/// Handle to one termynal widget instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Termynal {
    /// Position of the source block among the page's console blocks.
    pub id: usize,
    pub lines: Vec<LineDescriptor>,
    pub config: AnimationConfig,
    top: f64,
    started: bool,
}

impl Termynal {
    pub fn new(id: usize, lines: Vec<LineDescriptor>, config: AnimationConfig, top: f64) -> Self {
        let started = config.auto_start();
        Termynal {
            id,
            lines,
            config,
            top,
            started,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Animation for Termynal {
    fn container_top(&self) -> f64 {
        self.top
    }

    fn init(&mut self) {
        if self.started {
            return;
        }
        tracing::debug!(id = self.id, lines = self.lines.len(), "starting animation");
        self.started = true;
    }
}
