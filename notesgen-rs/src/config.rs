//! `.notesgenrc` configuration file parser.
//!
//! One setting per line:
//!
//! | Key | Value | Default |
//! |-----|-------|---------|
//! | `timeout` | milliseconds per snippet, > 0 | `1000` |
//! | `recursive` | boolean | `off` |
//! | `template` | boolean; `off` writes the bare HTML body | `on` |
//! | `extension` | output file extension | `html` |
//!
//! Booleans accept `on`/`off`, `true`/`false`, `yes`/`no`, `1`/`0`.  Lines
//! starting with `;` or `#` are comments.  Bad lines are reported as
//! [`ConfigError`]s and otherwise ignored; the remaining lines still apply.

use std::path::Path;
use std::time::Duration;

use crate::script::DEFAULT_TIMEOUT;

/// Default extension of generated files.
pub const DEFAULT_EXTENSION: &str = "html";

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Settings read from a config file, starting from the built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub timeout: Duration,
    pub recursive: bool,
    pub template: bool,
    pub extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timeout: DEFAULT_TIMEOUT,
            recursive: false,
            template: true,
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string on top of the defaults.
    ///
    /// Returns the config and a list of any errors on individual lines.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected `key = value`, found '{line}'"),
                });
                continue;
            };

            if let Err(msg) = config.set(key.trim(), unquote(value.trim())) {
                errors.push(ConfigError { line: lineno, message: msg });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Apply one `key = value` setting.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "timeout" => {
                self.timeout = crate::cli::parse_timeout(value)?;
            }
            "recursive" => self.recursive = parse_bool(key, value)?,
            "template" => self.template = parse_bool(key, value)?,
            "extension" => {
                let ext = value.trim_start_matches('.');
                if ext.is_empty() || ext.contains(['/', '\\']) {
                    return Err(format!("invalid extension: '{value}'"));
                }
                self.extension = ext.to_owned();
            }
            "" => return Err("setting name cannot be empty".into()),
            _ => return Err(format!("unknown setting '{key}'")),
        }
        Ok(())
    }
}

// ── Value helpers ─────────────────────────────────────────────────────────────

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("{key}: expected on/off, found '{value}'")),
    }
}

/// Strip one pair of surrounding double quotes.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.timeout, Duration::from_millis(1000));
        assert!(!cfg.recursive);
        assert!(cfg.template);
        assert_eq!(cfg.extension, "html");
    }

    #[test]
    fn all_keys() {
        let (cfg, errs) = Config::load_str(
            "timeout = 250\n\
             recursive = on\n\
             template = off\n\
             extension = htm",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.timeout, Duration::from_millis(250));
        assert!(cfg.recursive);
        assert!(!cfg.template);
        assert_eq!(cfg.extension, "htm");
    }

    #[test]
    fn boolean_spellings() {
        for (text, want) in [("1", true), ("TRUE", true), ("yes", true), ("0", false), ("No", false)] {
            let (cfg, errs) = Config::load_str(&format!("recursive={text}"));
            assert!(errs.is_empty(), "{errs:?}");
            assert_eq!(cfg.recursive, want, "{text}");
        }
    }

    #[test]
    fn quoted_value_and_leading_dot() {
        let (cfg, errs) = Config::load_str("extension = \".xhtml\"");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.extension, "xhtml");
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let (cfg, errs) = Config::load_str(
            "; comment\n\
             # another\n\
             \n\
             timeout = 50\n",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.timeout, Duration::from_millis(50));
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let (cfg, errs) = Config::load_str(
            "colour = blue\n\
             timeout = 0\n\
             recursive = maybe\n\
             just words\n\
             template = off",
        );
        assert_eq!(errs.iter().map(|e| e.line).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!(errs[0].message.contains("unknown setting 'colour'"));
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
        assert!(!cfg.template);
    }

    #[test]
    fn error_display() {
        let e = ConfigError { line: 3, message: "oops".into() };
        assert_eq!(e.to_string(), "line 3: oops");
    }

    #[test]
    fn load_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".notesgenrc");
        std::fs::write(&path, "timeout = 75\n").unwrap();
        let (cfg, errs) = Config::load_file(&path).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.timeout, Duration::from_millis(75));
        assert!(Config::load_file(&dir.path().join("missing")).is_err());
    }
}
