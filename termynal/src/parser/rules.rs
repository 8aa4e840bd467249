//! Line classification rules, evaluated in priority order.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::line::LineDescriptor;

pub const PROGRESS_LITERAL: &str = "---> 100%";
pub const PROMPT_MARKER: &str = "?> ";
pub const CUSTOM_PROMPT_PREFIX: &str = "# ";
pub const COMMENT_PREFIX: &str = "// ";

/// `(attrs)?> rest`, anchored so that `# prompt?> ...` lines fall through to
/// the custom-prompt rule.
static ANNOTATED_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\(([^)]*)\))?\?>(.*)$").expect("annotated input pattern"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_]+)=([A-Za-z0-9_]+)").expect("attribute pattern")
});

/// Result of a rule that recognized a line.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Emit(LineDescriptor),
    /// Recognized as a custom prompt but missing its delimiter.
    Malformed,
}

pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<Classification>,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "annotated-input",
        apply: annotated_input,
    },
    Rule {
        name: "progress",
        apply: progress,
    },
    Rule {
        name: "comment",
        apply: comment,
    },
    Rule {
        name: "custom-prompt",
        apply: custom_prompt,
    },
];

/// First matching rule wins. `None` means the line is plain output.
pub fn classify(line: &str) -> Option<(&'static str, Classification)> {
    RULES
        .iter()
        .find_map(|rule| (rule.apply)(line).map(|c| (rule.name, c)))
}

fn annotated_input(line: &str) -> Option<Classification> {
    let caps = ANNOTATED_INPUT.captures(line)?;
    let rest = caps.get(2).map_or("", |m| m.as_str());
    let mut value = rest.strip_prefix(' ').unwrap_or(rest).to_string();
    let mut prompt = None;
    let mut attrs = BTreeMap::new();

    if let Some(group) = caps.get(1) {
        // Later duplicates overwrite earlier ones.
        for pair in ATTRIBUTE.captures_iter(group.as_str()) {
            let (key, val) = (&pair[1], &pair[2]);
            match key {
                "prompt" => prompt = Some(val.to_string()),
                "value" => value = val.to_string(),
                "type" => tracing::debug!(line, "ignoring `type` annotation"),
                _ => {
                    attrs.insert(key.to_string(), val.to_string());
                }
            }
        }
    }

    Some(Classification::Emit(LineDescriptor::Input {
        value,
        prompt,
        attrs,
    }))
}

fn progress(line: &str) -> Option<Classification> {
    (line == PROGRESS_LITERAL).then_some(Classification::Emit(LineDescriptor::Progress))
}

fn comment(line: &str) -> Option<Classification> {
    let text = line.strip_prefix(COMMENT_PREFIX)?;
    Some(Classification::Emit(LineDescriptor::comment(text.trim_end())))
}

fn custom_prompt(line: &str) -> Option<Classification> {
    let rest = line.strip_prefix(CUSTOM_PROMPT_PREFIX)?;
    Some(match rest.find(PROMPT_MARKER) {
        Some(pos) => Classification::Emit(LineDescriptor::prompted(
            &rest[..pos],
            &rest[pos + PROMPT_MARKER.len()..],
        )),
        None => Classification::Malformed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitted(line: &str) -> LineDescriptor {
        match classify(line) {
            Some((_, Classification::Emit(d))) => d,
            other => panic!("expected a descriptor for {:?}, got {:?}", line, other),
        }
    }

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bare_prompt_marker() {
        assert_eq!(emitted("?> echo hi"), LineDescriptor::input("echo hi"));
        assert_eq!(emitted("?>"), LineDescriptor::input(""));
    }

    #[test]
    fn annotation_becomes_attributes() {
        assert_eq!(
            emitted("(user=alice)?> whoami"),
            LineDescriptor::Input {
                value: "whoami".into(),
                prompt: None,
                attrs: attrs(&[("user", "alice")]),
            }
        );
    }

    #[test]
    fn annotation_tokens_ignore_separators_and_last_wins() {
        assert_eq!(
            emitted("(a=1, b=2 a=3)?> x"),
            LineDescriptor::Input {
                value: "x".into(),
                prompt: None,
                attrs: attrs(&[("a", "3"), ("b", "2")]),
            }
        );
    }

    #[test]
    fn reserved_annotation_keys() {
        assert_eq!(
            emitted("(prompt=root type=progress)?> ls"),
            LineDescriptor::prompted("root", "ls")
        );
        assert_eq!(emitted("(value=other)?> ls"), LineDescriptor::input("other"));
    }

    #[test]
    fn marker_must_start_the_line() {
        assert_eq!(classify("echo ?> no"), None);
        assert_eq!(classify(" ?> indented"), None);
    }

    #[test]
    fn empty_annotation_group_is_plain_input() {
        assert_eq!(emitted("()?> x"), LineDescriptor::input("x"));
        assert_eq!(emitted("(nothing here)?> y"), LineDescriptor::input("y"));
    }

    #[test]
    fn progress_is_exact() {
        assert_eq!(emitted("---> 100%"), LineDescriptor::Progress);
        assert_eq!(classify("---> 100% "), None);
        assert_eq!(classify("---> 50%"), None);
    }

    #[test]
    fn comment_trims_trailing_whitespace() {
        assert_eq!(
            emitted("// build finished  \t"),
            LineDescriptor::comment("build finished")
        );
        assert_eq!(classify("//no space"), None);
    }

    #[test]
    fn custom_prompt_splits_on_marker() {
        assert_eq!(
            emitted("# root?> ls -la"),
            LineDescriptor::prompted("root", "ls -la")
        );
        assert_eq!(
            emitted("# (venv) $?> pip install"),
            LineDescriptor::prompted("(venv) $", "pip install")
        );
    }

    #[test]
    fn custom_prompt_without_marker_is_malformed() {
        assert_eq!(
            classify("# root ls -la"),
            Some(("custom-prompt", Classification::Malformed))
        );
        assert_eq!(
            classify("# root?>ls"),
            Some(("custom-prompt", Classification::Malformed))
        );
    }

    #[test]
    fn plain_lines_match_nothing() {
        assert_eq!(classify("hello"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("#no-space"), None);
    }
}
