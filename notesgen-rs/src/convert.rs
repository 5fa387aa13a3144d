//! Markdown → HTML conversion, for strings and for files on disk.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::input::InputFile;
use crate::markup::{html_template, render_html, RenderBridge};
use crate::script::{Console, Evaluator, TracingConsole, DEFAULT_TIMEOUT};

/// How documents are rendered.
#[derive(Clone)]
pub struct RenderOptions {
    /// Per-snippet time limit.
    pub timeout: Duration,
    /// Wrap the body in [`html_template`].
    pub template: bool,
    /// Where snippet `console.*` output goes.
    pub console: Arc<dyn Console>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions { timeout: DEFAULT_TIMEOUT, template: true, console: Arc::new(TracingConsole) }
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("timeout", &self.timeout)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// Error converting a file.
#[derive(Debug)]
pub enum ConvertError {
    Read { path: PathBuf, source: io::Error },
    Write { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::Read { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ConvertError::Write { path, source } => {
                write!(f, "cannot write {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Read { source, .. } | ConvertError::Write { source, .. } => Some(source),
        }
    }
}

/// Render one Markdown document.
pub fn convert_markdown_to_html(markdown: &str, options: &RenderOptions) -> String {
    let mut bridge =
        RenderBridge::with_console(Evaluator::new(options.timeout), Arc::clone(&options.console));
    let body = render_html(markdown, &mut bridge);
    if options.template {
        html_template(&body)
    } else {
        body
    }
}

/// Convert every file in `files`, creating output directories as needed.
///
/// Stops at the first failure.  Returns the number of files written.
pub fn process_files(files: &[InputFile], options: &RenderOptions) -> Result<usize, ConvertError> {
    for file in files {
        let markdown = fs::read_to_string(&file.path)
            .map_err(|source| ConvertError::Read { path: file.path.clone(), source })?;

        let html = convert_markdown_to_html(&markdown, options);

        let write_err = |source| ConvertError::Write { path: file.output.clone(), source };
        if let Some(parent) = file.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&file.output, html).map_err(write_err)?;

        tracing::info!(input = %file.path.display(), output = %file.output.display(), "converted");
        println!("✓ Converted {} → {}", file.path.display(), file.output.display());
    }
    Ok(files.len())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::BufferConsole;

    fn bare() -> RenderOptions {
        RenderOptions { template: false, console: Arc::new(BufferConsole::new()), ..RenderOptions::default() }
    }

    #[test]
    fn bare_body() {
        assert_eq!(convert_markdown_to_html("# @2^10@", &bare()), "<h1>1024</h1>");
    }

    #[test]
    fn templated_page() {
        let opts = RenderOptions { template: true, ..bare() };
        let page = convert_markdown_to_html("hello", &opts);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<body>\n<p>hello</p>\n</body>"));
    }

    #[test]
    fn timeout_option_is_used() {
        let opts = RenderOptions { timeout: Duration::from_millis(50), ..bare() };
        let out = convert_markdown_to_html("@@\nwhile true do end\n@@", &opts);
        assert!(out.contains("Script execution timed out after 50ms"));
    }

    #[test]
    fn files_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.md");
        fs::write(&input, "@1 + 1@").unwrap();
        let output = dir.path().join("out").join("a.html");
        let files = vec![InputFile { path: input, output: output.clone() }];

        assert_eq!(process_files(&files, &bare()).unwrap(), 1);
        assert_eq!(fs::read_to_string(output).unwrap(), "<p>2</p>");
    }

    #[test]
    fn missing_input_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![InputFile {
            path: dir.path().join("missing.md"),
            output: dir.path().join("missing.html"),
        }];
        let err = process_files(&files, &bare()).unwrap_err();
        assert!(matches!(err, ConvertError::Read { .. }));
        assert!(err.to_string().starts_with("cannot read"));
    }
}
