//! Token tree produced by the tokenization pass.
//!
//! Tokens are byte spans over the source text.  Container tokens own their
//! fence, value, and line-ending children; the tree is built once per parse
//! by [`Effects`](super::effects::Effects) and only read afterwards.

use std::fmt;
use std::ops::Range;

// ── TokenKind ─────────────────────────────────────────────────────────────────

/// The name of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Block construct: `@@ … @@`
    FlowContainer,
    FlowFence,
    FlowValue,

    // Inline construct: `@ … @`
    TextContainer,
    TextFence,
    TextValue,

    // Shared
    LineEnding,
    Whitespace,

    // Host document structure
    Paragraph,
    Heading,
    HeadingFence,
    Data,
    BlankLine,
}

impl TokenKind {
    /// `true` for the two executable container kinds.
    pub fn is_container(self) -> bool {
        matches!(self, TokenKind::FlowContainer | TokenKind::TextContainer)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::FlowContainer => "flowContainer",
            TokenKind::FlowFence => "flowFence",
            TokenKind::FlowValue => "flowValue",
            TokenKind::TextContainer => "textContainer",
            TokenKind::TextFence => "textFence",
            TokenKind::TextValue => "textValue",
            TokenKind::LineEnding => "lineEnding",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Paragraph => "paragraph",
            TokenKind::Heading => "heading",
            TokenKind::HeadingFence => "headingFence",
            TokenKind::Data => "data",
            TokenKind::BlankLine => "blankLine",
        };
        f.write_str(name)
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

/// A named span over the input, with nested child tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub children: Vec<Token>,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize) -> Self {
        Token { kind, start, end: start, children: Vec::new() }
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Depth-first iterator over this token and all of its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Token> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let tok = stack.pop()?;
            stack.extend(tok.children.iter().rev());
            Some(tok)
        })
    }

    /// Direct children of the given kind.
    pub fn children_of(&self, kind: TokenKind) -> impl Iterator<Item = &Token> {
        self.children.iter().filter(move |t| t.kind == kind)
    }
}

// ── TokenTree ─────────────────────────────────────────────────────────────────

/// The committed tokens of one document, in source order.
///
/// A tree is only constructed by the tokenizer; once built it is read-only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenTree {
    roots: Vec<Token>,
}

impl TokenTree {
    pub(crate) fn from_roots(roots: Vec<Token>) -> Self {
        TokenTree { roots }
    }

    pub fn roots(&self) -> &[Token] {
        &self.roots
    }

    /// Every token in document order.
    pub fn walk(&self) -> impl Iterator<Item = &Token> {
        self.roots.iter().flat_map(Token::walk)
    }

    /// Number of tokens of `kind` anywhere in the tree.
    pub fn count(&self, kind: TokenKind) -> usize {
        self.walk().filter(|t| t.kind == kind).count()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
