use serde::{Deserialize, Serialize};

use crate::line::LineDescriptor;

/// Timing options handed to the animation widget alongside the lines.
///
/// Field names serialize in the widget's camelCase spelling. `no_init`
/// keeps the widget from starting on construction; the page starts it once
/// its container is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimationConfig {
    /// Milliseconds before the first line.
    pub start_delay: u32,
    /// Milliseconds per typed character.
    pub type_delay: u32,
    /// Milliseconds between lines.
    pub line_delay: u32,
    pub no_init: bool,
}

impl AnimationConfig {
    pub const fn new() -> Self {
        AnimationConfig {
            start_delay: 650,
            type_delay: 50,
            line_delay: 0,
            no_init: true,
        }
    }

    pub fn auto_start(&self) -> bool {
        !self.no_init
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything passed to the widget constructor: timing plus line data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions<'a> {
    #[serde(flatten)]
    pub config: AnimationConfig,
    pub line_data: &'a [LineDescriptor],
}

impl<'a> WidgetOptions<'a> {
    pub fn new(config: AnimationConfig, line_data: &'a [LineDescriptor]) -> Self {
        WidgetOptions { config, line_data }
    }
}
