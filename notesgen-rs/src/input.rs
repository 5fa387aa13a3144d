//! Input discovery and output path mapping.
//!
//! | Input | `-o` | Outputs |
//! |-------|------|---------|
//! | file `a.md` | — | `a.html` beside it |
//! | file `a.md` | file `x.html` | `x.html` |
//! | file `a.md` | directory `d/` | `d/a.html` |
//! | directory `n/` (or none: `.`) | — | each `*.md` → `*.html` beside it |
//! | directory `n/` | directory `d/` | mirrored under `d/` |
//!
//! Only `*.md` files are picked up; subdirectories are searched with
//! `recursive`.  Files are listed in path order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of files picked up from directories.
pub const INPUT_EXTENSION: &str = "md";

// ── Public types ──────────────────────────────────────────────────────────────

/// One file to convert and where its HTML goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub output: PathBuf,
}

/// What the command line asked to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    SingleFile(PathBuf),
    Directory(PathBuf),
}

/// Error resolving inputs or outputs.
#[derive(Debug)]
pub enum InputError {
    MultipleInputs(usize),
    NotFound(PathBuf),
    OutputNotDirectory(PathBuf),
    Io { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::MultipleInputs(n) => {
                write!(f, "multiple input files or directories are not supported ({n} given)")
            }
            InputError::NotFound(p) => write!(f, "invalid input path: {}", p.display()),
            InputError::OutputNotDirectory(p) => {
                write!(f, "output path must be a directory: {}", p.display())
            }
            InputError::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> InputError + '_ {
    move |source| InputError::Io { path: path.to_path_buf(), source }
}

// ── InputMode ─────────────────────────────────────────────────────────────────

impl InputMode {
    /// Classify the positional inputs.  No input means the working directory.
    pub fn resolve(inputs: &[PathBuf]) -> Result<Self, InputError> {
        match inputs {
            [] => Ok(InputMode::Directory(PathBuf::from("."))),
            [path] if path.is_file() => Ok(InputMode::SingleFile(path.clone())),
            [path] if path.is_dir() => Ok(InputMode::Directory(path.clone())),
            [path] => Err(InputError::NotFound(path.clone())),
            _ => Err(InputError::MultipleInputs(inputs.len())),
        }
    }

    /// Every file to convert, with its output path.
    ///
    /// In directory mode a missing `output` directory is created; an existing
    /// `output` that is not a directory is an error.
    pub fn input_files(
        &self,
        recursive: bool,
        output: Option<&Path>,
        extension: &str,
    ) -> Result<Vec<InputFile>, InputError> {
        match self {
            InputMode::SingleFile(path) => {
                let output = match output {
                    None => path.with_extension(extension),
                    Some(out) if is_directory_like(out) => {
                        out.join(output_name(path, extension))
                    }
                    Some(out) => out.to_path_buf(),
                };
                Ok(vec![InputFile { path: path.clone(), output }])
            }
            InputMode::Directory(dir) => {
                if let Some(out) = output {
                    if out.exists() && !out.is_dir() {
                        return Err(InputError::OutputNotDirectory(out.to_path_buf()));
                    }
                    fs::create_dir_all(out).map_err(io_error(out))?;
                }
                let files = find_files(dir, recursive)?;
                Ok(files
                    .into_iter()
                    .map(|path| {
                        let output = match output {
                            None => path.with_extension(extension),
                            Some(out) => {
                                let rel = path.strip_prefix(dir).unwrap_or(&path);
                                out.join(rel).with_extension(extension)
                            }
                        };
                        InputFile { path, output }
                    })
                    .collect())
            }
        }
    }
}

/// `name.md` → `name.<extension>`.
fn output_name(path: &Path, extension: &str) -> PathBuf {
    let name = path.file_name().map(PathBuf::from).unwrap_or_default();
    name.with_extension(extension)
}

/// An existing directory, or a path that does not exist yet and either ends
/// with a separator or has no extension.
fn is_directory_like(path: &Path) -> bool {
    if path.exists() {
        return path.is_dir();
    }
    let text = path.as_os_str().to_string_lossy();
    text.ends_with(std::path::MAIN_SEPARATOR) || text.ends_with('/') || path.extension().is_none()
}

/// `*.md` files under `dir`, sorted; subdirectories only when `recursive`.
pub fn find_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, InputError> {
    let mut entries = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error(dir))?;
    entries.sort();

    let mut files = Vec::new();
    for path in entries {
        if path.is_file() && path.extension().is_some_and(|e| e == INPUT_EXTENSION) {
            files.push(path);
        } else if recursive && path.is_dir() {
            files.extend(find_files(&path, recursive)?);
        }
    }
    Ok(files)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
