//! Character cursor with a tentative token builder.
//!
//! Scanners never write to the committed token tree directly.  Each attempt
//! runs against its own scratch [`Effects`]: tokens are opened, filled, and
//! closed there, and only when the scanner reports success are they handed
//! back (see [`Effects::attempt`]).  A failed attempt simply drops the
//! scratch builder, so no partially built token can leak.

use super::token::{Token, TokenKind};

// ── Code ──────────────────────────────────────────────────────────────────────

/// One input unit as seen by a scanner.
///
/// `\n`, `\r`, and `\r\n` all surface as a single [`Code::LineEnding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Char(char),
    LineEnding,
    Eof,
}

impl Code {
    pub fn is(self, ch: char) -> bool {
        self == Code::Char(ch)
    }

    /// Space or horizontal tab.
    pub fn is_space_or_tab(self) -> bool {
        matches!(self, Code::Char(' ' | '\t'))
    }

    pub fn is_line_ending_or_eof(self) -> bool {
        matches!(self, Code::LineEnding | Code::Eof)
    }
}

// ── Scanned ───────────────────────────────────────────────────────────────────

/// Tokens produced by a successful attempt, and where the attempt stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned {
    pub tokens: Vec<Token>,
    pub end: usize,
}

// ── Effects ───────────────────────────────────────────────────────────────────

/// Peekable cursor over `src[start..limit]` plus a stack of open tokens.
#[derive(Debug)]
pub struct Effects<'a> {
    src: &'a str,
    pos: usize,
    limit: usize,
    stack: Vec<Token>,
    committed: Vec<Token>,
}

impl<'a> Effects<'a> {
    /// Cursor over the whole of `src`.
    pub fn new(src: &'a str) -> Self {
        Self::bounded(src, 0, src.len())
    }

    /// Cursor over `src[start..limit]`; [`Code::Eof`] is reported at `limit`.
    pub fn bounded(src: &'a str, start: usize, limit: usize) -> Self {
        debug_assert!(start <= limit && limit <= src.len());
        Effects { src, pos: start, limit, stack: Vec::new(), committed: Vec::new() }
    }

    /// Run `scan` on a scratch builder starting at `start`.
    ///
    /// Returns the committed tokens only if the scanner succeeded and closed
    /// every token it opened; otherwise returns `None` and nothing is kept.
    pub fn attempt<F>(src: &'a str, start: usize, limit: usize, scan: F) -> Option<Scanned>
    where
        F: FnOnce(&mut Effects<'a>) -> bool,
    {
        let mut scratch = Effects::bounded(src, start, limit);
        if !scan(&mut scratch) {
            return None;
        }
        if !scratch.stack.is_empty() {
            debug_assert!(false, "scanner succeeded with open tokens: {:?}", scratch.stack);
            return None;
        }
        Some(Scanned { tokens: scratch.committed, end: scratch.pos })
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The unconsumed input up to the limit.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..self.limit]
    }

    /// The current code, without consuming it.
    pub fn peek(&self) -> Code {
        match self.rest().chars().next() {
            None => Code::Eof,
            Some('\n' | '\r') => Code::LineEnding,
            Some(c) => Code::Char(c),
        }
    }

    /// Open a token of `kind` at the current position.
    pub fn enter(&mut self, kind: TokenKind) {
        self.stack.push(Token::new(kind, self.pos));
    }

    /// Close the most recently opened token, which must be of `kind`.
    pub fn exit(&mut self, kind: TokenKind) {
        let Some(mut tok) = self.stack.pop() else {
            debug_assert!(false, "exit({kind}) with no open token");
            return;
        };
        debug_assert_eq!(tok.kind, kind, "mismatched exit");
        tok.end = self.pos;
        self.attach(tok);
    }

    /// Move past the current code into the innermost open token.
    pub fn consume(&mut self) {
        debug_assert!(!self.stack.is_empty(), "consume outside of a token");
        let rest = self.rest();
        let step = if rest.starts_with("\r\n") {
            2
        } else {
            rest.chars().next().map_or(0, char::len_utf8)
        };
        debug_assert!(step > 0, "consume at end of input");
        self.pos += step;
    }

    /// Undo a tentative fence: the just-closed `fence` child of the open
    /// container is removed and its span becomes `value` content again.
    ///
    /// If the fence directly follows a `value` token, that token is reopened
    /// and extended; otherwise a new `value` token is opened at the fence's
    /// start.  Either way the value is left open at the current position.
    pub fn revert_fence(&mut self, fence: TokenKind, value: TokenKind) {
        let Some(parent) = self.stack.last_mut() else {
            debug_assert!(false, "revert_fence({fence}) with no open container");
            return;
        };
        let Some(probe) = parent.children.pop() else {
            debug_assert!(false, "revert_fence({fence}) with no closed child");
            return;
        };
        debug_assert_eq!(probe.kind, fence);

        let reopened = match parent.children.last() {
            Some(prev) if prev.kind == value && prev.end == probe.start => parent.children.pop(),
            _ => None,
        };
        self.stack.push(reopened.unwrap_or_else(|| Token::new(value, probe.start)));
    }

    /// Append tokens produced by a successful nested attempt and move the
    /// cursor to where that attempt stopped.
    pub fn splice(&mut self, scanned: Scanned) {
        debug_assert!(scanned.end >= self.pos && scanned.end <= self.limit);
        for tok in scanned.tokens {
            self.attach(tok);
        }
        self.pos = scanned.end;
    }

    /// Hand back every committed token.  All tokens must be closed.
    pub fn finish(self) -> Vec<Token> {
        debug_assert!(self.stack.is_empty(), "unclosed tokens: {:?}", self.stack);
        self.committed
    }

    fn attach(&mut self, tok: Token) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(tok),
            None => self.committed.push(tok),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
