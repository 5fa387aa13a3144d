//! notesgen: Markdown notes to HTML, with executable Lua snippets.
//!
//! `@expr@` inside text and `@@ … @@` blocks at line start are evaluated at
//! render time and replaced by their result.
//!
//! ```rust
//! use notesgen::convert::{convert_markdown_to_html, RenderOptions};
//!
//! let opts = RenderOptions { template: false, ..RenderOptions::default() };
//! assert_eq!(convert_markdown_to_html("@1 + 1@", &opts), "<p>2</p>");
//! ```

pub mod cli;
pub mod config;
pub mod convert;
pub mod input;
pub mod markup;
pub mod script;
