//! Document tokenizer: block structure plus inline text.
//!
//! Only as much Markdown as the executable constructs need a home in:
//!
//! | Block | Recognised as |
//! |-------|---------------|
//! | blank line (spaces/tabs only) | [`TokenKind::BlankLine`] |
//! | `@@` fence at line start | [`TokenKind::FlowContainer`] (see [`flow`](super::flow)) |
//! | `#`..`######` + space or line end | [`TokenKind::Heading`] |
//! | anything else | [`TokenKind::Paragraph`] |
//!
//! Paragraph and heading text is split into [`TokenKind::Data`],
//! [`TokenKind::LineEnding`], and inline [`TokenKind::TextContainer`]
//! tokens.  An `@` that does not open an inline construct is kept as data.

use super::effects::{Code, Effects};
use super::flow::{scan_flow, FENCE};
use super::text::scan_text;
use super::token::{TokenKind, TokenTree};

const MAX_HEADING_LEVEL: usize = 6;

/// Tokenize a whole document.
pub fn tokenize(src: &str) -> TokenTree {
    let mut fx = Effects::new(src);
    while fx.peek() != Code::Eof {
        block(&mut fx);
    }
    TokenTree::from_roots(fx.finish())
}

fn block(fx: &mut Effects<'_>) {
    let start = fx.position();
    let rest = fx.rest();

    if is_blank_line(rest) {
        blank_line(fx);
    } else if let Some(scanned) = scan_flow(fx.src(), start) {
        fx.splice(scanned);
    } else if let Some(level) = heading_level(rest) {
        heading(fx, level);
    } else {
        paragraph(fx);
    }
}

// ── Blocks ────────────────────────────────────────────────────────────────────

fn blank_line(fx: &mut Effects<'_>) {
    fx.enter(TokenKind::BlankLine);
    while fx.peek().is_space_or_tab() {
        fx.consume();
    }
    if fx.peek() == Code::LineEnding {
        fx.consume();
    }
    fx.exit(TokenKind::BlankLine);
}

fn heading(fx: &mut Effects<'_>, level: usize) {
    fx.enter(TokenKind::Heading);

    fx.enter(TokenKind::HeadingFence);
    for _ in 0..level {
        fx.consume();
    }
    fx.exit(TokenKind::HeadingFence);

    whitespace(fx);

    let end = fx.position() + trimmed_len(fx.rest());
    inline(fx, end);
    whitespace(fx);
    fx.exit(TokenKind::Heading);

    line_ending_if_any(fx);
}

fn paragraph(fx: &mut Effects<'_>) {
    let end = paragraph_end(fx.src(), fx.position());
    fx.enter(TokenKind::Paragraph);
    inline(fx, end);
    fx.exit(TokenKind::Paragraph);
    line_ending_if_any(fx);
}

/// Byte offset where the paragraph starting at `start` stops, excluding its
/// final line ending.
///
/// A paragraph continues line by line until a blank line, end of input, a
/// heading, or a line that opens a block construct.
fn paragraph_end(src: &str, start: usize) -> usize {
    let mut content_end = start + line_content_len(&src[start..]);
    loop {
        let le = line_ending_len(&src[content_end..]);
        if le == 0 {
            return content_end;
        }
        let next = content_end + le;
        let line = &src[next..];
        if line.is_empty()
            || is_blank_line(line)
            || heading_level(line).is_some()
            || scan_flow(src, next).is_some()
        {
            return content_end;
        }
        content_end = next + line_content_len(line);
    }
}

// ── Inline ────────────────────────────────────────────────────────────────────

/// Tokenize `src[position..limit]` as inline text.
fn inline(fx: &mut Effects<'_>, limit: usize) {
    let src = fx.src();
    while fx.position() < limit {
        let pos = fx.position();
        let rest = &src[pos..limit];

        if rest.starts_with(FENCE) {
            match scan_text(src, pos, limit) {
                Some(scanned) => fx.splice(scanned),
                None => data(fx, pos + FENCE.len_utf8()),
            }
        } else if fx.peek() == Code::LineEnding {
            line_ending(fx);
        } else {
            let run = rest
                .find(|c| c == FENCE || c == '\n' || c == '\r')
                .unwrap_or(rest.len());
            data(fx, pos + run);
        }
    }
}

fn data(fx: &mut Effects<'_>, until: usize) {
    fx.enter(TokenKind::Data);
    while fx.position() < until {
        fx.consume();
    }
    fx.exit(TokenKind::Data);
}

fn whitespace(fx: &mut Effects<'_>) {
    if !fx.peek().is_space_or_tab() {
        return;
    }
    fx.enter(TokenKind::Whitespace);
    while fx.peek().is_space_or_tab() {
        fx.consume();
    }
    fx.exit(TokenKind::Whitespace);
}

fn line_ending(fx: &mut Effects<'_>) {
    fx.enter(TokenKind::LineEnding);
    fx.consume();
    fx.exit(TokenKind::LineEnding);
}

fn line_ending_if_any(fx: &mut Effects<'_>) {
    if fx.peek() == Code::LineEnding {
        line_ending(fx);
    }
}

// ── Line helpers ──────────────────────────────────────────────────────────────

/// Length of the first line of `s`, without its line ending.
fn line_content_len(s: &str) -> usize {
    s.find(['\n', '\r']).unwrap_or(s.len())
}

/// Length of the first line of `s` with trailing spaces/tabs removed.
fn trimmed_len(s: &str) -> usize {
    s[..line_content_len(s)].trim_end_matches([' ', '\t']).len()
}

/// Length of the line ending at the start of `s` (0, 1, or 2).
fn line_ending_len(s: &str) -> usize {
    if s.starts_with("\r\n") {
        2
    } else if s.starts_with(['\n', '\r']) {
        1
    } else {
        0
    }
}

fn is_blank_line(s: &str) -> bool {
    s[..line_content_len(s)].chars().all(|c| c == ' ' || c == '\t')
}

/// ATX heading level if `s` starts with 1–6 `#` followed by a space, tab,
/// line ending, or end of input.
fn heading_level(s: &str) -> Option<usize> {
    let level = s.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > MAX_HEADING_LEVEL {
        return None;
    }
    match s[level..].chars().next() {
        None | Some(' ' | '\t' | '\n' | '\r') => Some(level),
        Some(_) => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
