//! Bridge between the compile pass and the evaluator.
//!
//! While a container is open its value text is captured into a scratch
//! buffer instead of the page; when the container closes, the captured
//! snippet is evaluated in a fresh [`EvaluationContext`] and the formatted
//! result (or an error span) is written in its place.

use std::sync::Arc;

use super::html::{escape_html, CompileContext, HtmlExtension};
use super::token::{Token, TokenKind};
use crate::script::{
    Console, EvaluationContext, EvaluationOutcome, Evaluator, ScriptValue, TracingConsole,
};

/// CSS class of the span that replaces a failed snippet.
pub const ERROR_CLASS: &str = "executable-error";

/// [`HtmlExtension`] that evaluates `@…@` and `@@…@@` constructs.
pub struct RenderBridge {
    evaluator: Evaluator,
    console: Arc<dyn Console>,
}

impl RenderBridge {
    pub fn new(evaluator: Evaluator) -> Self {
        Self::with_console(evaluator, Arc::new(TracingConsole))
    }

    /// Bridge whose snippets log to `console`.
    pub fn with_console(evaluator: Evaluator, console: Arc<dyn Console>) -> Self {
        RenderBridge { evaluator, console }
    }

    /// Evaluate one captured snippet and render the outcome.
    pub fn render_snippet(&self, snippet: &str) -> String {
        let mut context = EvaluationContext::with_console(Arc::clone(&self.console));
        render_outcome(&self.evaluator.evaluate(snippet.trim(), &mut context))
    }
}

impl Default for RenderBridge {
    fn default() -> Self {
        Self::new(Evaluator::default())
    }
}

impl HtmlExtension for RenderBridge {
    fn enter(&mut self, cx: &mut CompileContext<'_>, token: &Token) -> bool {
        match token.kind {
            TokenKind::FlowContainer | TokenKind::TextContainer => {
                cx.buffer();
                true
            }
            TokenKind::FlowFence | TokenKind::TextFence => true,
            _ => false,
        }
    }

    fn exit(&mut self, cx: &mut CompileContext<'_>, token: &Token) -> bool {
        match token.kind {
            TokenKind::FlowValue | TokenKind::TextValue => {
                cx.raw(cx.slice_serialize(token));
                true
            }
            TokenKind::FlowContainer | TokenKind::TextContainer => {
                let snippet = cx.resume();
                let html = self.render_snippet(&snippet);
                cx.raw(&html);
                true
            }
            TokenKind::FlowFence | TokenKind::TextFence => true,
            _ => false,
        }
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// HTML for an evaluation outcome.
pub fn render_outcome(outcome: &EvaluationOutcome) -> String {
    match outcome {
        EvaluationOutcome::Success(value) => format_value(value),
        EvaluationOutcome::Failure { message } => error_span(message),
    }
}

/// `<span class="executable-error">Error: …</span>` with `message` escaped.
pub fn error_span(message: &str) -> String {
    format!(r#"<span class="{ERROR_CLASS}">Error: {}</span>"#, escape_html(message))
}

/// HTML for a successful result.
///
/// Scalars print as their literal text; strings are escaped as-is;
/// structured values print as escaped pretty JSON, falling back to their
/// plain text when they have no JSON form.
pub fn format_value(value: &ScriptValue) -> String {
    match value {
        ScriptValue::Str(s) => escape_html(s),
        _ if value.is_structured() => match value.to_pretty_json() {
            Ok(json) => escape_html(&json),
            Err(_) => escape_html(&value.to_string()),
        },
        _ => value.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
