use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use termynal::AnimationConfig;
use termynal::document::DEFAULT_LANGUAGE;

/// Settings file picked up from the working directory when `--config` is
/// not given.
pub const DEFAULT_FILE: &str = "termynal.toml";

#[derive(Debug)]
pub enum CliError {
    Io { path: PathBuf, error: std::io::Error },
    Config { path: PathBuf, message: String },
    Encode(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { path, error } => {
                write!(f, "cannot read '{}': {}", path.display(), error)
            }
            CliError::Config { path, message } => {
                write!(f, "invalid settings in '{}': {}", path.display(), message)
            }
            CliError::Encode(msg) => write!(f, "cannot encode output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Encode(e.to_string())
    }
}

impl From<termynal::render::RenderError> for CliError {
    fn from(e: termynal::render::RenderError) -> Self {
        CliError::Encode(e.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub scan: ScanSettings,
    pub animation: AnimationSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    /// Fence info strings that mark console blocks.
    pub languages: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            languages: vec![DEFAULT_LANGUAGE.to_string()],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationSettings {
    pub start_delay: u32,
    pub type_delay: u32,
    pub line_delay: u32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        let config = AnimationConfig::default();
        AnimationSettings {
            start_delay: config.start_delay,
            type_delay: config.type_delay,
            line_delay: config.line_delay,
        }
    }
}

impl AnimationSettings {
    /// Widget options; animations never start on their own.
    pub fn to_config(&self) -> AnimationConfig {
        AnimationConfig {
            start_delay: self.start_delay,
            type_delay: self.type_delay,
            line_delay: self.line_delay,
            no_init: true,
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load settings from `explicit`, or from [`DEFAULT_FILE`] in `dir` if it
    /// exists. Defaults otherwise.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, CliError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(DEFAULT_FILE);
                if !candidate.is_file() {
                    return Ok(Settings::default());
                }
                candidate
            }
        };
        tracing::debug!(path = %path.display(), "loading settings");
        let text = std::fs::read_to_string(&path).map_err(|error| CliError::Io {
            path: path.clone(),
            error,
        })?;
        Settings::from_toml(&text, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("", Path::new("t.toml")).unwrap();
        assert_eq!(settings.scan.languages, vec!["console"]);
        assert_eq!(settings.animation.to_config(), AnimationConfig::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let settings = Settings::from_toml(
            "[scan]\nlanguages = [\"console\", \"shell-session\"]\n[animation]\ntype_delay = 30\n",
            Path::new("t.toml"),
        )
        .unwrap();
        assert_eq!(settings.scan.languages, vec!["console", "shell-session"]);
        let config = settings.animation.to_config();
        assert_eq!(config.type_delay, 30);
        assert_eq!(config.start_delay, 650);
        assert!(config.no_init);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml("[animation]\nspeed = 3\n", Path::new("t.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("t.toml"));
    }

    #[test]
    fn load_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "[animation]\nstart_delay = 0\n").unwrap();
        std::fs::write(dir.path().join(DEFAULT_FILE), "[animation]\nstart_delay = 9\n").unwrap();

        let settings = Settings::load(Some(custom.as_path()), dir.path()).unwrap();
        assert_eq!(settings.animation.start_delay, 0);

        let settings = Settings::load(None, dir.path()).unwrap();
        assert_eq!(settings.animation.start_delay, 9);
    }

    #[test]
    fn load_without_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(None, dir.path()).unwrap();
        assert_eq!(settings.animation.start_delay, 650);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Settings::load(Some(missing.as_path()), dir.path()),
            Err(CliError::Io { .. })
        ));
    }
}
