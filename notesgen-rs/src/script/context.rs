//! Variable scope handed to one evaluation call.
//!
//! An [`EvaluationContext`] is the snippet's global scope: bindings present
//! before the call are visible to the snippet, and every global the snippet
//! assigns (new or existing) is written back when the call returns.
//!
//! The context also carries the `console` capability.  It is an explicit
//! [`Console`] trait object rather than ambient state, so callers decide
//! where snippet log output goes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::value::ScriptValue;

// ── Console ───────────────────────────────────────────────────────────────────

/// Severity of a console call; one variant per `console.*` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Log,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] =
        [LogLevel::Debug, LogLevel::Log, LogLevel::Info, LogLevel::Warn, LogLevel::Error];

    /// Method name under `console` in the sandbox.
    pub fn method_name(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Log => "log",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Sink for `console.*` calls made by snippets.
pub trait Console: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Default console: forwards to `tracing` under the `notesgen::console` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "notesgen::console", "{message}"),
            LogLevel::Log | LogLevel::Info => {
                tracing::info!(target: "notesgen::console", "{message}")
            }
            LogLevel::Warn => tracing::warn!(target: "notesgen::console", "{message}"),
            LogLevel::Error => tracing::error!(target: "notesgen::console", "{message}"),
        }
    }
}

/// Console that keeps every message in memory.
#[derive(Debug, Default)]
pub struct BufferConsole {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged so far, oldest first.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Console for BufferConsole {
    fn log(&self, level: LogLevel, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_owned()));
        }
    }
}

// ── EvaluationContext ─────────────────────────────────────────────────────────

/// Mutable variable bag plus console for a single evaluation.
#[derive(Clone)]
pub struct EvaluationContext {
    bindings: BTreeMap<String, ScriptValue>,
    console: Arc<dyn Console>,
}

impl EvaluationContext {
    /// Empty context with the default [`TracingConsole`].
    pub fn new() -> Self {
        Self::with_console(Arc::new(TracingConsole))
    }

    /// Empty context logging to `console`.
    pub fn with_console(console: Arc<dyn Console>) -> Self {
        EvaluationContext { bindings: BTreeMap::new(), console }
    }

    /// Set (or overwrite) a binding.
    pub fn set(&mut self, name: impl Into<String>, value: ScriptValue) {
        self.bindings.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ScriptValue> {
        self.bindings.get(name)
    }

    /// Remove a binding.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.bindings.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScriptValue)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn console(&self) -> Arc<dyn Console> {
        Arc::clone(&self.console)
    }

    pub(crate) fn bindings(&self) -> &BTreeMap<String, ScriptValue> {
        &self.bindings
    }

    pub(crate) fn replace_bindings(&mut self, bindings: BTreeMap<String, ScriptValue>) {
        self.bindings = bindings;
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
