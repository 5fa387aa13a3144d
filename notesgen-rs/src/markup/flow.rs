//! Block executable construct: `@@ … @@`.
//!
//! ```text
//! @@
//! total = 2 + 3
//! total * 10
//! @@
//! ```
//!
//! The opening fence is a run of two or more `@` at the start of a line.  It
//! is closed by a run of **at least** as many `@`, optionally followed by
//! spaces/tabs, then a line ending or end of input.  Content may start on the
//! fence's own line.  A block left open runs to the end of the document.
//!
//! A run of `@` inside the content that is shorter than the opening fence
//! does not close the block; it is kept as part of the snippet.

use super::effects::{Code, Effects, Scanned};
use super::token::TokenKind;

/// The fence character shared by both executable constructs.
pub const FENCE: char = '@';

/// Smallest opening fence recognised as a block.
pub const MIN_FLOW_FENCE: usize = 2;

/// Attempt to scan a block construct at `start`, which must be a line start.
///
/// Returns the single committed [`TokenKind::FlowContainer`] on success;
/// `None` leaves no trace.
pub fn scan_flow(src: &str, start: usize) -> Option<Scanned> {
    Effects::attempt(src, start, src.len(), |fx| FlowScanner::new().run(fx))
}

// ── State machine ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    SequenceOpen,
    ContentStart,
    Content,
    SequenceClose { size_close: usize },
    TrailingWhitespace,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next(State),
    Ok,
    Nok,
}

/// Block recognizer.  One instance scans one attempt.
#[derive(Debug, Default)]
pub struct FlowScanner {
    size_open: usize,
}

impl FlowScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the machine to completion; `true` means the container is closed
    /// and ready to commit.
    pub fn run(mut self, fx: &mut Effects<'_>) -> bool {
        let mut state = State::Start;
        loop {
            match self.step(state, fx) {
                Step::Next(next) => state = next,
                Step::Ok => return true,
                Step::Nok => return false,
            }
        }
    }

    fn step(&mut self, state: State, fx: &mut Effects<'_>) -> Step {
        let code = fx.peek();
        match state {
            State::Start => {
                if !code.is(FENCE) {
                    return Step::Nok;
                }
                fx.enter(TokenKind::FlowContainer);
                fx.enter(TokenKind::FlowFence);
                Step::Next(State::SequenceOpen)
            }

            State::SequenceOpen => {
                if code.is(FENCE) {
                    fx.consume();
                    self.size_open += 1;
                    return Step::Next(State::SequenceOpen);
                }
                if self.size_open < MIN_FLOW_FENCE {
                    return Step::Nok;
                }
                fx.exit(TokenKind::FlowFence);
                if code == Code::LineEnding {
                    line_ending(fx);
                    return Step::Next(State::ContentStart);
                }
                fx.enter(TokenKind::FlowValue);
                Step::Next(State::Content)
            }

            State::ContentStart => {
                fx.enter(TokenKind::FlowValue);
                Step::Next(State::Content)
            }

            State::Content => match code {
                Code::Char(FENCE) => {
                    // Possibly the closing fence; probe it.
                    fx.exit(TokenKind::FlowValue);
                    fx.enter(TokenKind::FlowFence);
                    Step::Next(State::SequenceClose { size_close: 0 })
                }
                Code::Eof => {
                    fx.exit(TokenKind::FlowValue);
                    fx.exit(TokenKind::FlowContainer);
                    Step::Ok
                }
                Code::LineEnding => {
                    fx.exit(TokenKind::FlowValue);
                    line_ending(fx);
                    Step::Next(State::ContentStart)
                }
                Code::Char(_) => {
                    fx.consume();
                    Step::Next(State::Content)
                }
            },

            State::SequenceClose { size_close } => {
                if code.is(FENCE) {
                    fx.consume();
                    return Step::Next(State::SequenceClose { size_close: size_close + 1 });
                }
                fx.exit(TokenKind::FlowFence);
                if size_close < self.size_open {
                    // Too short to close: the run is snippet text after all.
                    fx.revert_fence(TokenKind::FlowFence, TokenKind::FlowValue);
                    return Step::Next(State::Content);
                }
                if code.is_space_or_tab() {
                    fx.enter(TokenKind::Whitespace);
                    return Step::Next(State::TrailingWhitespace);
                }
                Step::Next(State::After)
            }

            State::TrailingWhitespace => {
                if code.is_space_or_tab() {
                    fx.consume();
                    return Step::Next(State::TrailingWhitespace);
                }
                fx.exit(TokenKind::Whitespace);
                Step::Next(State::After)
            }

            State::After => match code {
                Code::Eof => {
                    fx.exit(TokenKind::FlowContainer);
                    Step::Ok
                }
                Code::LineEnding => {
                    line_ending(fx);
                    fx.exit(TokenKind::FlowContainer);
                    Step::Ok
                }
                // A matched closing fence may not share its line with content.
                Code::Char(_) => Step::Nok,
            },
        }
    }
}

fn line_ending(fx: &mut Effects<'_>) {
    fx.enter(TokenKind::LineEnding);
    fx.consume();
    fx.exit(TokenKind::LineEnding);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
