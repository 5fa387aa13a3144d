//! Inline executable construct: `@ … @`.
//!
//! Exactly one `@` opens and one `@` closes; there is no fence-length
//! negotiation.  Line endings are ordinary content, so an inline snippet may
//! wrap across lines of the same paragraph.  Without a closing `@` before the
//! end of the scanned range the attempt fails and the opener is plain text.

use super::effects::{Code, Effects, Scanned};
use super::flow::FENCE;
use super::token::TokenKind;

/// Attempt to scan an inline construct at `start`, bounded by `limit` (the
/// end of the enclosing paragraph or heading text).
pub fn scan_text(src: &str, start: usize, limit: usize) -> Option<Scanned> {
    Effects::attempt(src, start, limit, |fx| TextScanner.run(fx))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Value,
}

/// Inline recognizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextScanner;

impl TextScanner {
    pub fn run(self, fx: &mut Effects<'_>) -> bool {
        let mut state = State::Start;
        loop {
            let code = fx.peek();
            state = match state {
                State::Start => {
                    if !code.is(FENCE) {
                        return false;
                    }
                    fx.enter(TokenKind::TextContainer);
                    fence(fx);
                    fx.enter(TokenKind::TextValue);
                    State::Value
                }
                State::Value => match code {
                    Code::Char(FENCE) => {
                        fx.exit(TokenKind::TextValue);
                        fence(fx);
                        fx.exit(TokenKind::TextContainer);
                        return true;
                    }
                    Code::Eof => return false,
                    Code::Char(_) | Code::LineEnding => {
                        fx.consume();
                        State::Value
                    }
                },
            };
        }
    }
}

fn fence(fx: &mut Effects<'_>) {
    fx.enter(TokenKind::TextFence);
    fx.consume();
    fx.exit(TokenKind::TextFence);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
