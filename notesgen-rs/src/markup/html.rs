//! Compile pass: token tree → HTML fragment.
//!
//! [`compile`] walks the tree in document order.  For every token it first
//! offers the `enter`/`exit` event to each [`HtmlExtension`] in turn; the
//! built-in handlers run only when no extension claims the event.
//!
//! Output goes through a stack of buffers on the [`CompileContext`]:
//! [`buffer`](CompileContext::buffer) redirects writes into a fresh scratch
//! buffer and [`resume`](CompileContext::resume) pops it and returns its
//! contents.  Extensions use this to capture text instead of emitting it.

use std::sync::OnceLock;

use aho_corasick::AhoCorasick;

use super::token::{Token, TokenKind, TokenTree};

// ── Escaping ──────────────────────────────────────────────────────────────────

const ESCAPE_PATTERNS: [&str; 5] = ["&", "<", ">", "\"", "'"];
const ESCAPE_REPLACEMENTS: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#039;"];

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    static ESCAPER: OnceLock<AhoCorasick> = OnceLock::new();
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return text.to_owned();
    }
    ESCAPER
        .get_or_init(|| AhoCorasick::new(ESCAPE_PATTERNS))
        .replace_all(text, &ESCAPE_REPLACEMENTS)
}

// ── CompileContext ────────────────────────────────────────────────────────────

/// Output state of one compile pass.
#[derive(Debug)]
pub struct CompileContext<'a> {
    src: &'a str,
    buffers: Vec<String>,
}

impl<'a> CompileContext<'a> {
    pub fn new(src: &'a str) -> Self {
        CompileContext { src, buffers: vec![String::new()] }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    /// Start capturing output into a new buffer.
    pub fn buffer(&mut self) {
        self.buffers.push(String::new());
    }

    /// Stop capturing and return what the innermost buffer collected.
    ///
    /// The outermost buffer is never popped; resuming it just drains it.
    pub fn resume(&mut self) -> String {
        if self.buffers.len() > 1 {
            self.buffers.pop().unwrap_or_default()
        } else {
            std::mem::take(&mut self.buffers[0])
        }
    }

    /// Write `html` unchanged.
    pub fn raw(&mut self, html: &str) {
        if let Some(buf) = self.buffers.last_mut() {
            buf.push_str(html);
        }
    }

    /// Write a tag (or any other trusted markup).
    pub fn tag(&mut self, tag: &str) {
        self.raw(tag);
    }

    /// Write `text` with HTML escaping.
    pub fn text(&mut self, text: &str) {
        let escaped = escape_html(text);
        self.raw(&escaped);
    }

    /// Write a `\n` unless the current buffer is empty or already ends with
    /// a line ending.
    pub fn line_ending(&mut self) {
        let needed = self
            .buffers
            .last()
            .is_some_and(|b| !b.is_empty() && !b.ends_with(['\n', '\r']));
        if needed {
            self.raw("\n");
        }
    }

    /// The exact source text under `token`.
    pub fn slice_serialize(&self, token: &Token) -> &'a str {
        &self.src[token.span()]
    }

    /// Everything written to the outermost buffer.
    pub fn finish(mut self) -> String {
        while self.buffers.len() > 1 {
            let inner = self.resume();
            self.raw(&inner);
        }
        self.resume()
    }
}

// ── Extensions ────────────────────────────────────────────────────────────────

/// Hooks into the compile pass.
///
/// Returning `true` claims the event: the built-in handler for that token is
/// skipped.  Children are still visited either way.
pub trait HtmlExtension {
    fn enter(&mut self, _cx: &mut CompileContext<'_>, _token: &Token) -> bool {
        false
    }

    fn exit(&mut self, _cx: &mut CompileContext<'_>, _token: &Token) -> bool {
        false
    }
}

/// Compile `tree` (tokenized from `src`) to an HTML fragment.
///
/// Top-level blocks are separated by a single `\n`; blank lines and the line
/// endings between blocks produce no output of their own.
pub fn compile(src: &str, tree: &TokenTree, extensions: &mut [&mut dyn HtmlExtension]) -> String {
    let mut cx = CompileContext::new(src);
    for root in tree.roots() {
        if matches!(root.kind, TokenKind::LineEnding | TokenKind::BlankLine) {
            continue;
        }
        cx.line_ending();
        visit(&mut cx, root, extensions);
    }
    cx.finish()
}

fn visit(cx: &mut CompileContext<'_>, token: &Token, extensions: &mut [&mut dyn HtmlExtension]) {
    let claimed = extensions.iter_mut().any(|ext| ext.enter(cx, token));
    if !claimed && token.kind.is_container() {
        // No extension evaluates snippets: show the construct as written.
        cx.text(cx.slice_serialize(token));
        return;
    }
    if !claimed {
        default_enter(cx, token);
    }

    for child in &token.children {
        visit(cx, child, extensions);
    }

    if !extensions.iter_mut().any(|ext| ext.exit(cx, token)) {
        default_exit(cx, token);
    }
}

// ── Built-in handlers ─────────────────────────────────────────────────────────

fn default_enter(cx: &mut CompileContext<'_>, token: &Token) {
    match token.kind {
        TokenKind::Paragraph => cx.tag("<p>"),
        TokenKind::Heading => cx.tag(&format!("<h{}>", heading_rank(token))),
        _ => {}
    }
}

fn default_exit(cx: &mut CompileContext<'_>, token: &Token) {
    match token.kind {
        TokenKind::Paragraph => cx.tag("</p>"),
        TokenKind::Heading => cx.tag(&format!("</h{}>", heading_rank(token))),
        TokenKind::Data => cx.text(cx.slice_serialize(token)),
        TokenKind::LineEnding => cx.raw(cx.slice_serialize(token)),
        _ => {}
    }
}

/// Number of `#` in the heading's fence.
fn heading_rank(heading: &Token) -> usize {
    heading
        .children_of(TokenKind::HeadingFence)
        .next()
        .map_or(1, |fence| fence.end - fence.start)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
