//! Markdown tokenizer and HTML compiler with executable snippets.
//!
//! Two passes per document:
//!
//! 1. [`document::tokenize`] builds a [`TokenTree`].  At each line start the
//!    block scanner ([`flow`]) is tried; inside paragraph and heading text,
//!    each `@` tries the inline scanner ([`text`]).  Both commit all or
//!    nothing through [`effects::Effects`].
//! 2. [`html::compile`] walks the tree; the [`render::RenderBridge`]
//!    extension captures each snippet, evaluates it, and writes the result.
//!
//! ```rust
//! use notesgen::markup::{render_html, RenderBridge};
//!
//! let html = render_html("Answer: @6 * 7@", &mut RenderBridge::default());
//! assert_eq!(html, "<p>Answer: 42</p>");
//! ```

pub mod document;
pub mod effects;
pub mod flow;
pub mod html;
pub mod render;
pub mod template;
pub mod text;
pub mod token;

pub use document::tokenize;
pub use html::{compile, escape_html, CompileContext, HtmlExtension};
pub use render::{format_value, RenderBridge};
pub use template::html_template;
pub use token::{Token, TokenKind, TokenTree};

/// Tokenize and compile `markdown` with `bridge` evaluating its snippets.
pub fn render_html(markdown: &str, bridge: &mut RenderBridge) -> String {
    let tree = tokenize(markdown);
    let ext: &mut dyn HtmlExtension = bridge;
    compile(markdown, &tree, &mut [ext])
}
