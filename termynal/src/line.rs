use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// CSS class the widget applies to comment lines.
pub const COMMENT_CLASS: &str = "termynal-comment";

/// Marker prepended to every comment line.
pub const COMMENT_MARKER: &str = "💬 ";

/// Separator used when a run of output lines is collapsed into one value.
pub const LINE_BREAK: &str = "<br>";

/// One unit of animated output.
///
/// Serializes to the object shape the termynal widget reads from its
/// `lineData` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDescriptor {
    /// A line typed out as user input.
    Input {
        value: String,
        /// Custom prompt label; the widget's default prompt when `None`.
        prompt: Option<String>,
        /// Free-form `key=value` parameters taken from the line's annotation.
        attrs: BTreeMap<String, String>,
    },
    /// A progress bar.
    Progress,
    /// A comment shown instantly. `value` already carries [`COMMENT_MARKER`].
    Comment { value: String },
    /// Literal output, possibly several source lines joined by [`LINE_BREAK`].
    Output { value: String, delay: Option<u32> },
}

impl LineDescriptor {
    /// An input line with no prompt and no extra attributes.
    pub fn input(value: impl Into<String>) -> Self {
        LineDescriptor::Input {
            value: value.into(),
            prompt: None,
            attrs: BTreeMap::new(),
        }
    }

    /// An input line with a custom prompt.
    pub fn prompted(prompt: impl Into<String>, value: impl Into<String>) -> Self {
        LineDescriptor::Input {
            value: value.into(),
            prompt: Some(prompt.into()),
            attrs: BTreeMap::new(),
        }
    }

    /// A comment line; the marker is added here.
    pub fn comment(text: &str) -> Self {
        LineDescriptor::Comment {
            value: format!("{}{}", COMMENT_MARKER, text),
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            LineDescriptor::Input { value, .. }
            | LineDescriptor::Comment { value }
            | LineDescriptor::Output { value, .. } => Some(value.as_str()),
            LineDescriptor::Progress => None,
        }
    }

    /// Explicit delay before the line, `None` when the widget default applies.
    pub fn delay(&self) -> Option<u32> {
        match self {
            LineDescriptor::Comment { .. } => Some(0),
            LineDescriptor::Output { delay, .. } => *delay,
            _ => None,
        }
    }

    /// Wire name of the line type, if the widget expects one.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            LineDescriptor::Input { .. } => Some("input"),
            LineDescriptor::Progress => Some("progress"),
            LineDescriptor::Comment { .. } | LineDescriptor::Output { .. } => None,
        }
    }
}

impl Serialize for LineDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(kind) = self.kind() {
            map.serialize_entry("type", kind)?;
        }
        match self {
            LineDescriptor::Input {
                value,
                prompt,
                attrs,
            } => {
                map.serialize_entry("value", value)?;
                if let Some(prompt) = prompt {
                    map.serialize_entry("prompt", prompt)?;
                }
                for (key, val) in attrs {
                    map.serialize_entry(key, val)?;
                }
            }
            LineDescriptor::Progress => {}
            LineDescriptor::Comment { value } => {
                map.serialize_entry("value", value)?;
                map.serialize_entry("class", COMMENT_CLASS)?;
            }
            LineDescriptor::Output { value, .. } => {
                map.serialize_entry("value", value)?;
            }
        }
        if let Some(delay) = self.delay() {
            map.serialize_entry("delay", &delay)?;
        }
        map.end()
    }
}

impl fmt::Display for LineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineDescriptor::Input {
                value,
                prompt,
                attrs,
            } => {
                write!(f, "input")?;
                if let Some(prompt) = prompt {
                    write!(f, " [{}]", prompt)?;
                }
                write!(f, " {:?}", value)?;
                for (key, val) in attrs {
                    write!(f, " {}={}", key, val)?;
                }
                Ok(())
            }
            LineDescriptor::Progress => write!(f, "progress"),
            LineDescriptor::Comment { value } => write!(f, "comment {:?}", value),
            LineDescriptor::Output { value, delay } => {
                write!(f, "output {:?}", value)?;
                if let Some(delay) = delay {
                    write!(f, " delay={}", delay)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_wire_form_flattens_attributes() {
        let mut attrs = BTreeMap::new();
        attrs.insert("user".to_string(), "alice".to_string());
        let line = LineDescriptor::Input {
            value: "whoami".into(),
            prompt: Some("$".into()),
            attrs,
        };
        assert_eq!(
            serde_json::to_value(&line).unwrap(),
            json!({"type": "input", "value": "whoami", "prompt": "$", "user": "alice"})
        );
    }

    #[test]
    fn comment_wire_form_has_class_and_zero_delay() {
        let line = LineDescriptor::comment("done");
        assert_eq!(
            serde_json::to_value(&line).unwrap(),
            json!({"value": "💬 done", "class": "termynal-comment", "delay": 0})
        );
    }

    #[test]
    fn output_omits_delay_unless_set() {
        let plain = LineDescriptor::Output {
            value: "a<br>b".into(),
            delay: None,
        };
        let blank = LineDescriptor::Output {
            value: "<br>".into(),
            delay: Some(0),
        };
        assert_eq!(serde_json::to_value(&plain).unwrap(), json!({"value": "a<br>b"}));
        assert_eq!(
            serde_json::to_value(&blank).unwrap(),
            json!({"value": "<br>", "delay": 0})
        );
    }

    #[test]
    fn progress_is_type_only() {
        assert_eq!(
            serde_json::to_value(&LineDescriptor::Progress).unwrap(),
            json!({"type": "progress"})
        );
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(
            LineDescriptor::prompted("root", "ls").to_string(),
            "input [root] \"ls\""
        );
        assert_eq!(LineDescriptor::Progress.to_string(), "progress");
    }
}
