//! Command-line argument parsing.
//!
//! Usage:
//!   notesgen [-r] [-o <path>] [-t <ms>] [-f[<file>]] [-bvh] [<input>]

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

pub const USAGE: &str = "Usage: notesgen [-r] [-o <path>] [-t <ms>] [-f[<file>]] [-bvh] [<input>]";

pub const HELP: &str = "\
Convert Markdown notes to HTML, evaluating @inline@ and @@block@@ Lua snippets.

Options:
  -r, --recursive        process directories recursively
  -o, --output <path>    output file or directory
  -t, --timeout <ms>     per-snippet time limit in milliseconds
  -f<file>               read configuration from <file>
  -f                     do not read any configuration file
  -b, --bare             emit the HTML body only, without the page template
  -v, --verbose          log evaluation details to stderr
  -h, --help             show this help

Examples:
  notesgen README.md              README.html
  notesgen README.md -o out.html  out.html
  notesgen docs/                  docs/*.html
  notesgen docs/ -o dist/         dist/*.html
  notesgen docs/ -r               docs/**.html
  notesgen docs/ -r -o dist/      dist/ (mirrored tree)";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Recurse into subdirectories (`-r`).
    pub recursive: bool,
    /// Output file or directory (`-o <path>`).
    pub output: Option<PathBuf>,
    /// Snippet timeout override (`-t <ms>`).
    pub timeout: Option<Duration>,
    /// Config-file specification.
    pub config: ConfigFile,
    /// Skip the page template (`-b`).
    pub bare: bool,
    /// Debug-level logging (`-v`).
    pub verbose: bool,
    /// Print help and exit (`-h`).
    pub help: bool,
    /// Positional input paths.  More than one is rejected later, when the
    /// input mode is resolved.
    pub inputs: Vec<PathBuf>,
}

/// How to choose the config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// `./.notesgenrc`, then `config` in the user config dir (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip config.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            args.inputs.extend(argv[i..].iter().map(PathBuf::from));
            break;
        }

        if let Some(long) = arg.strip_prefix("--") {
            i = parse_long(long, argv, i, &mut args)?;
            i += 1;
            continue;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            args.inputs.push(PathBuf::from(arg));
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'r' => args.recursive = true,
                'b' => args.bare = true,
                'v' => args.verbose = true,
                'h' => args.help = true,

                // -f[<file>]; the file must be attached so that a following
                // input path is never taken for it.
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // -o<path> / -o <path>
                'o' => {
                    let path = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-o requires a path argument".to_owned());
                    };
                    args.output = Some(PathBuf::from(path));
                }

                // -t<ms> / -t <ms>
                't' => {
                    let ms = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-t requires a millisecond argument".to_owned());
                    };
                    args.timeout = Some(parse_timeout(&ms)?);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    Ok(args)
}

/// Handle `--name[=value]` at `argv[i]`; returns the index of the last
/// argument consumed.
fn parse_long(long: &str, argv: &[String], mut i: usize, args: &mut CliArgs) -> Result<usize, String> {
    let (name, inline) = match long.split_once('=') {
        Some((n, v)) => (n, Some(v.to_owned())),
        None => (long, None),
    };
    let mut value = |what: &str| -> Result<String, String> {
        if let Some(v) = &inline {
            return Ok(v.clone());
        }
        if i + 1 < argv.len() {
            i += 1;
            return Ok(argv[i].clone());
        }
        Err(format!("--{name} requires {what}"))
    };

    match name {
        "recursive" => args.recursive = true,
        "bare" => args.bare = true,
        "verbose" => args.verbose = true,
        "help" => args.help = true,
        "output" => args.output = Some(PathBuf::from(value("a path argument")?)),
        "timeout" => args.timeout = Some(parse_timeout(&value("a millisecond argument")?)?),
        _ => return Err(format!("unknown option: --{name}")),
    }
    Ok(i)
}

/// Milliseconds, strictly positive.
pub fn parse_timeout(s: &str) -> Result<Duration, String> {
    match s.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(format!("invalid timeout: {s} (expected milliseconds > 0)")),
        Ok(ms) => Ok(Duration::from_millis(ms)),
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Name of the per-directory config file.
pub const LOCAL_CONFIG: &str = ".notesgenrc";

/// Search for the config file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let user = ProjectDirs::from("", "", "notesgen").map(|dirs| dirs.config_dir().join("config"));
    std::iter::once(PathBuf::from(LOCAL_CONFIG))
        .chain(user)
        .find(|p| p.is_file())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert!(!a.recursive);
        assert!(a.inputs.is_empty());
        assert!(a.output.is_none());
        assert!(matches!(a.config, ConfigFile::Search));
    }

    #[test]
    fn input_positional() {
        let a = parse_argv(&argv(&["notes.md"])).unwrap();
        assert_eq!(a.inputs, vec![PathBuf::from("notes.md")]);
    }

    #[test]
    fn multiple_positional_are_collected() {
        let a = parse_argv(&argv(&["a.md", "b.md"])).unwrap();
        assert_eq!(a.inputs.len(), 2);
    }

    #[test]
    fn bool_flags() {
        let a = parse_argv(&argv(&["-r", "-b", "-v", "-h"])).unwrap();
        assert!(a.recursive && a.bare && a.verbose && a.help);
    }

    #[test]
    fn combined_bool_flags() {
        let a = parse_argv(&argv(&["-rbv"])).unwrap();
        assert!(a.recursive && a.bare && a.verbose);
    }

    #[test]
    fn output_embedded_and_separate() {
        let a = parse_argv(&argv(&["-odist"])).unwrap();
        assert_eq!(a.output, Some(PathBuf::from("dist")));
        let a = parse_argv(&argv(&["docs", "-o", "dist/"])).unwrap();
        assert_eq!(a.output, Some(PathBuf::from("dist/")));
        assert_eq!(a.inputs, vec![PathBuf::from("docs")]);
    }

    #[test]
    fn output_after_combined_flags() {
        let a = parse_argv(&argv(&["-ro", "out"])).unwrap();
        assert!(a.recursive);
        assert_eq!(a.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn missing_output_value() {
        assert!(parse_argv(&argv(&["-o"])).is_err());
    }

    #[test]
    fn timeout_values() {
        let a = parse_argv(&argv(&["-t", "250"])).unwrap();
        assert_eq!(a.timeout, Some(Duration::from_millis(250)));
        let a = parse_argv(&argv(&["-t50"])).unwrap();
        assert_eq!(a.timeout, Some(Duration::from_millis(50)));
        assert!(parse_argv(&argv(&["-t", "0"])).is_err());
        assert!(parse_argv(&argv(&["-t", "soon"])).is_err());
    }

    #[test]
    fn long_options() {
        let a = parse_argv(&argv(&["--recursive", "--output", "dist", "--timeout=300", "--bare", "docs"]))
            .unwrap();
        assert!(a.recursive && a.bare);
        assert_eq!(a.output, Some(PathBuf::from("dist")));
        assert_eq!(a.timeout, Some(Duration::from_millis(300)));
        assert_eq!(a.inputs, vec![PathBuf::from("docs")]);
    }

    #[test]
    fn config_skip() {
        let a = parse_argv(&argv(&["-f", "docs"])).unwrap();
        assert!(matches!(a.config, ConfigFile::Skip));
        assert_eq!(a.inputs, vec![PathBuf::from("docs")]);
    }

    #[test]
    fn config_explicit_embedded() {
        let a = parse_argv(&argv(&["-fmy.rc"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("my.rc")));
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = parse_argv(&argv(&["--", "-odd.md"])).unwrap();
        assert_eq!(a.inputs, vec![PathBuf::from("-odd.md")]);
        assert!(a.output.is_none());
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z"])).is_err());
        assert!(parse_argv(&argv(&["--zap"])).is_err());
    }
}
