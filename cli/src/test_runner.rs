use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use termynal::ParseError;
use termynal::document::{self, line_number};

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedBlock {
    /// Line data in the widget's wire form.
    pub lines: Vec<toml::Value>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Fence languages treated as console blocks. Defaults to the settings.
    #[serde(default)]
    pub languages: Option<Vec<String>>,

    /// Expected transcripts, one per console block in document order.
    #[serde(default)]
    pub expect_block: Option<Vec<ExpectedBlock>>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.test.md` file into its TOML config and Markdown body.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path, default_languages: &[String]) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let languages = config.languages.as_deref().unwrap_or(default_languages);
    let blocks = document::scan(source, languages);
    let mut warnings: Vec<ParseError> = Vec::new();
    let mut transcripts = Vec::new();
    for block in &blocks {
        let mut transcript = block.transcript(0);
        warnings.append(&mut transcript.warnings);
        transcripts.push(transcript.lines);
    }

    if let Some(expected) = &config.expect_block {
        if let Some(reason) = check_blocks(&transcripts, expected) {
            return fail(description, reason);
        }
    }

    if let Some(expected) = &config.expect_warnings {
        if let Some(reason) = check_warnings(source, &warnings, expected) {
            return fail(description, reason);
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

/// Compare actual transcripts with expectations through their JSON form.
fn check_blocks(
    actual: &[Vec<termynal::LineDescriptor>],
    expected: &[ExpectedBlock],
) -> Option<String> {
    if actual.len() != expected.len() {
        return Some(format!(
            "expected {} console block(s), got {}",
            expected.len(),
            actual.len()
        ));
    }

    for (i, (lines, block)) in actual.iter().zip(expected).enumerate() {
        let got = match serde_json::to_value(lines) {
            Ok(v) => v,
            Err(e) => return Some(format!("block[{}]: cannot encode lines: {}", i, e)),
        };
        let want = match serde_json::to_value(&block.lines) {
            Ok(v) => v,
            Err(e) => return Some(format!("block[{}]: cannot encode expectation: {}", i, e)),
        };
        if got != want {
            return Some(format!(
                "block[{}]: line data mismatch\n  expected: {}\n  actual:   {}",
                i, want, got
            ));
        }
    }

    None
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    warnings: &[ParseError],
    expected: &[ExpectedWarning],
) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = warnings.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected.iter()).enumerate() {
        let msg = actual.to_string();

        if !msg.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = line_number(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".test.md") {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn paint(s: &str, code: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    }
}

fn label_for(result: &TestResult) -> String {
    result.description.clone().unwrap_or_else(|| {
        result
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("?")
            .to_string()
    })
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String], languages: &[String]) -> i32 {
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        if categories.is_empty() {
            all_categories
        } else {
            filter_categories(all_categories, categories)
        }
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        if !path.is_file() {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", paint(header, "1", no_color));
        }

        for file in files {
            let result = run_single_test(file, languages);
            let label = label_for(&result);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), label);
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), label);
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            paint("ok", "32", no_color),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

fn filter_categories(
    all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let before = filtered.len();
        for (cat, files) in &all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.clone(), files.clone());
            }
        }
        if filtered.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "---
description = \"install session\"
expect_warnings = [{ contains = \"no end delimiter\", line = 9 }]

[[expect_block]]
lines = [{ type = \"input\", value = \"pip install x\" }, { type = \"progress\" }]

[[expect_block]]
lines = []
---
# Install

```console
?> pip install x
---> 100%
```

```console
# root ls
```
";

    fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn console() -> Vec<String> {
        vec!["console".to_string()]
    }

    #[test]
    fn frontmatter_splits_config_and_body() {
        let (config, body) = parse_test_file(FIXTURE).unwrap();
        assert_eq!(config.description.as_deref(), Some("install session"));
        assert_eq!(config.expect_block.as_ref().map(Vec::len), Some(2));
        assert!(body.starts_with("# Install"));
    }

    #[test]
    fn missing_frontmatter_is_reported() {
        assert!(parse_test_file("# no config").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn passing_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "install.test.md", FIXTURE);
        let result = run_single_test(&path, &console());
        match result.outcome {
            TestOutcome::Pass => {}
            TestOutcome::Fail(reason) => panic!("fixture failed: {}", reason),
        }
    }

    #[test]
    fn mismatched_lines_fail() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = FIXTURE.replace("pip install x\" }", "pip install y\" }");
        let path = write_fixture(dir.path(), "bad.test.md", &fixture);
        let result = run_single_test(&path, &console());
        assert!(matches!(result.outcome, TestOutcome::Fail(ref r) if r.contains("block[0]")));
    }

    #[test]
    fn run_tests_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "ok.test.md", FIXTURE);
        assert_eq!(run_tests(dir.path(), true, &[], &console()), 0);

        let sub = dir.path().join("broken");
        std::fs::create_dir(&sub).unwrap();
        write_fixture(&sub, "warn.test.md", &FIXTURE.replace("line = 9", "line = 3"));
        assert_eq!(run_tests(dir.path(), true, &[], &console()), 1);
        assert_eq!(run_tests(dir.path(), true, &["broken".to_string()], &console()), 1);
        assert_eq!(run_tests(dir.path(), true, &["missing".to_string()], &console()), 1);
    }

    #[test]
    fn shipped_fixtures_pass() {
        let fixtures = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures"));
        assert_eq!(run_tests(fixtures, true, &[], &console()), 0);
        assert_eq!(run_tests(fixtures, true, &["parser".to_string()], &console()), 0);
    }
}
