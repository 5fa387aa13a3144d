//! Snippet evaluation.
//!
//! Snippets are Lua 5.4 run in a restricted sandbox (see [`engine`]) with a
//! wall-clock bound (see [`evaluator`]).  Results come back as
//! [`ScriptValue`]s wrapped in an [`EvaluationOutcome`].
//!
//! # Quick start
//!
//! ```rust
//! use notesgen::script::{EvaluationContext, Evaluator, ScriptValue};
//!
//! let mut ctx = EvaluationContext::new();
//! ctx.set("x", ScriptValue::Integer(6));
//! let out = Evaluator::default().evaluate("x * 7", &mut ctx);
//! assert_eq!(out.value(), Some(&ScriptValue::Integer(42)));
//! ```

pub mod context;
pub mod engine;
pub mod evaluator;
pub mod value;

pub use context::{BufferConsole, Console, EvaluationContext, LogLevel, TracingConsole};
pub use evaluator::{EvaluationOutcome, Evaluator, DEFAULT_TIMEOUT};
pub use value::ScriptValue;
