//! Result values produced by snippet evaluation.
//!
//! The engine is dynamically typed; [`ScriptValue`] is the closed set of
//! shapes a result can take once it leaves the engine, so that formatting
//! can match on it exhaustively.

use std::collections::BTreeMap;
use std::fmt;

/// Largest float magnitude below which every integer is exactly representable.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A value returned by (or bound into) a snippet evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// An explicit nil / `null`.
    Null,
    /// The snippet produced no value at all.
    Undefined,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Str(String),
    /// A table whose keys are exactly `1..=n`.
    Sequence(Vec<ScriptValue>),
    /// Any other table; keys are stringified and kept sorted.
    Mapping(BTreeMap<String, ScriptValue>),
    /// A function reference, described by its address.
    Function(String),
    /// Anything else the engine can hold (userdata, threads, cycles, …).
    Opaque(String),
}

/// Why a value could not be serialized to JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializeError {
    /// NaN and the infinities have no JSON form.
    NonFinite(f64),
    /// Functions and opaque engine values have no JSON form.
    Unserializable(&'static str),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeError::NonFinite(x) => write!(f, "cannot serialize {}", format_number(*x)),
            SerializeError::Unserializable(kind) => write!(f, "cannot serialize a {kind}"),
        }
    }
}

impl std::error::Error for SerializeError {}

impl ScriptValue {
    /// Short type name, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Null => "null",
            ScriptValue::Undefined => "undefined",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Integer(_) | ScriptValue::Float(_) => "number",
            ScriptValue::Str(_) => "string",
            ScriptValue::Sequence(_) => "sequence",
            ScriptValue::Mapping(_) => "mapping",
            ScriptValue::Function(_) => "function",
            ScriptValue::Opaque(_) => "opaque value",
        }
    }

    /// `true` for values whose rendering goes through JSON serialization.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            ScriptValue::Sequence(_)
                | ScriptValue::Mapping(_)
                | ScriptValue::Function(_)
                | ScriptValue::Opaque(_)
        )
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, SerializeError> {
        use serde_json::Value as Json;

        Ok(match self {
            ScriptValue::Null | ScriptValue::Undefined => Json::Null,
            ScriptValue::Bool(b) => Json::Bool(*b),
            ScriptValue::Integer(n) => Json::from(*n),
            ScriptValue::Float(x) if x.fract() == 0.0 && x.abs() <= MAX_SAFE_INTEGER => {
                Json::from(*x as i64)
            }
            ScriptValue::Float(x) => serde_json::Number::from_f64(*x)
                .map(Json::Number)
                .ok_or(SerializeError::NonFinite(*x))?,
            ScriptValue::Str(s) => Json::String(s.clone()),
            ScriptValue::Sequence(items) => {
                Json::Array(items.iter().map(ScriptValue::to_json).collect::<Result<_, _>>()?)
            }
            ScriptValue::Mapping(map) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in map {
                    obj.insert(k.clone(), v.to_json()?);
                }
                Json::Object(obj)
            }
            ScriptValue::Function(_) | ScriptValue::Opaque(_) => {
                return Err(SerializeError::Unserializable(self.type_name()))
            }
        })
    }

    /// Pretty-printed JSON: sorted keys, two-space indentation.
    pub fn to_pretty_json(&self) -> Result<String, SerializeError> {
        let json = self.to_json()?;
        // Serializing an in-memory `serde_json::Value` cannot fail.
        Ok(serde_json::to_string_pretty(&json).unwrap_or_default())
    }
}

/// Plain textual form of a value.
impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Null => f.write_str("null"),
            ScriptValue::Undefined => f.write_str("undefined"),
            ScriptValue::Bool(b) => write!(f, "{b}"),
            ScriptValue::Integer(n) => write!(f, "{n}"),
            ScriptValue::Float(x) => f.write_str(&format_number(*x)),
            ScriptValue::Str(s) => f.write_str(s),
            ScriptValue::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            ScriptValue::Mapping(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            ScriptValue::Function(desc) | ScriptValue::Opaque(desc) => f.write_str(desc),
        }
    }
}

/// Literal text of a floating-point number.
///
/// Integral values print without a fractional part (`5`, not `5.0`);
/// non-finite values print as `NaN`, `Infinity`, `-Infinity`.
pub fn format_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_owned()
    } else if x == f64::INFINITY {
        "Infinity".to_owned()
    } else if x == f64::NEG_INFINITY {
        "-Infinity".to_owned()
    } else if x == 0.0 {
        "0".to_owned()
    } else if x.fract() == 0.0 && x.abs() < 1e21 {
        format!("{x:.0}")
    } else {
        format!("{x}")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
