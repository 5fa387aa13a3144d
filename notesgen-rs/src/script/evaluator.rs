//! Time-bounded snippet evaluation.
//!
//! [`Evaluator::evaluate`] runs one snippet in a fresh [`LuaSession`] on a
//! worker thread.  The session aborts itself once the deadline passes; if the
//! worker still has not answered after a short grace period it is abandoned
//! and the caller gets the timeout failure anyway.  Nothing the snippet does
//! escapes as a panic or an `Err`: every outcome is an [`EvaluationOutcome`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::context::{Console, EvaluationContext};
use super::engine::{error_message, LuaSession, TIMEOUT_MESSAGE};
use super::value::ScriptValue;

/// Default wall-clock bound for one snippet.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Extra time given to the worker after the deadline before it is abandoned.
const GRACE: Duration = Duration::from_millis(250);

// ── EvaluationOutcome ─────────────────────────────────────────────────────────

/// Result of one evaluation call.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Success(ScriptValue),
    Failure { message: String },
}

impl EvaluationOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        EvaluationOutcome::Failure { message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EvaluationOutcome::Success(_))
    }

    /// The value on success.
    pub fn value(&self) -> Option<&ScriptValue> {
        match self {
            EvaluationOutcome::Success(v) => Some(v),
            EvaluationOutcome::Failure { .. } => None,
        }
    }

    /// The message on failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            EvaluationOutcome::Success(_) => None,
            EvaluationOutcome::Failure { message } => Some(message),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            EvaluationOutcome::Success(_) => "success",
            EvaluationOutcome::Failure { .. } => "failure",
        }
    }
}

impl fmt::Display for EvaluationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationOutcome::Success(v) => write!(f, "{v}"),
            EvaluationOutcome::Failure { message } => write!(f, "Error: {message}"),
        }
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// What the worker sends back: the outcome plus the scope to write back.
type Reply = (EvaluationOutcome, Option<BTreeMap<String, ScriptValue>>);

#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    timeout: Duration,
}

impl Evaluator {
    pub fn new(timeout: Duration) -> Self {
        Evaluator { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timeout_failure(&self) -> EvaluationOutcome {
        EvaluationOutcome::failure(format!(
            "{TIMEOUT_MESSAGE} after {}ms",
            self.timeout.as_millis()
        ))
    }

    /// Evaluate `snippet` with `context` as its global scope.
    ///
    /// Globals the snippet assigns are written back into `context`, whether
    /// the snippet finished normally or raised an error part-way.  On timeout
    /// the context is left untouched.
    ///
    /// A snippet blocked inside a C function never reaches the instruction
    /// hook; after the grace period its worker thread is abandoned and keeps
    /// running until it finishes or the process exits.
    pub fn evaluate(&self, snippet: &str, context: &mut EvaluationContext) -> EvaluationOutcome {
        let started = Instant::now();
        let snippet = snippet.trim().to_owned();
        let len = snippet.len();
        let bindings = context.bindings().clone();
        let console = context.console();
        let deadline = started + self.timeout;

        let (tx, rx) = mpsc::sync_channel::<Reply>(1);
        let spawned = thread::Builder::new()
            .name("notesgen-eval".into())
            .spawn(move || {
                let reply = run_isolated(&snippet, bindings, console, deadline);
                // The receiver is gone if the caller gave up on us.
                let _ = tx.send(reply);
            });
        if let Err(e) = spawned {
            return EvaluationOutcome::failure(format!("cannot start evaluation: {e}"));
        }

        let outcome = match rx.recv_timeout(self.timeout + GRACE) {
            Ok((outcome, scope)) => {
                if let Some(scope) = scope {
                    context.replace_bindings(scope);
                }
                match outcome {
                    EvaluationOutcome::Failure { ref message } if message == TIMEOUT_MESSAGE => {
                        self.timeout_failure()
                    }
                    other => other,
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "snippet missed its deadline; abandoning worker"
                );
                self.timeout_failure()
            }
            Err(RecvTimeoutError::Disconnected) => {
                EvaluationOutcome::failure("evaluation aborted unexpectedly")
            }
        };

        tracing::debug!(
            snippet_len = len,
            outcome = outcome.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluated snippet"
        );
        outcome
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(DEFAULT_TIMEOUT)
    }
}

/// Body of the worker thread.  A timed-out run reports the bare
/// [`TIMEOUT_MESSAGE`]; the caller adds the duration.
fn run_isolated(
    snippet: &str,
    bindings: BTreeMap<String, ScriptValue>,
    console: Arc<dyn Console>,
    deadline: Instant,
) -> Reply {
    let session = match LuaSession::new(console, deadline) {
        Ok(s) => s,
        Err(e) => return (EvaluationOutcome::failure(error_message(&e)), None),
    };
    for (name, value) in &bindings {
        if let Err(e) = session.bind(name, value) {
            return (EvaluationOutcome::failure(error_message(&e)), None);
        }
    }

    let result = session.run(snippet);
    if session.timed_out() {
        return (EvaluationOutcome::failure(TIMEOUT_MESSAGE), None);
    }
    let outcome = match result {
        Ok(value) => EvaluationOutcome::Success(value),
        Err(e) => EvaluationOutcome::failure(error_message(&e)),
    };
    (outcome, session.bindings().ok())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
