//! Lua 5.4 sandbox via the `mlua` crate.
//!
//! Each [`LuaSession`] owns a fresh interpreter with a restricted standard
//! library and a private global environment:
//!
//! | Reachable                        | Not reachable                        |
//! |----------------------------------|--------------------------------------|
//! | `string` `table` `math` `utf8` `coroutine` | `io` `os` `package` `debug` |
//! | `pairs` `ipairs` `type` `tostring` `tonumber` `pcall` … | `load` `loadfile` `dofile` `require` |
//! | `console.log/info/warn/error/debug`, `print` | `collectgarbage` |
//!
//! Reading an unbound global raises `<name> is not defined`; `null` and
//! `undefined` are predeclared as nil.  An instruction-count hook aborts the
//! snippet once its deadline passes.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use mlua::prelude::*;
use mlua::{HookTriggers, LuaOptions, StdLib, Variadic, VmState};
use regex::Regex;

use super::context::{Console, LogLevel};
use super::value::{format_number, ScriptValue};

/// Name given to snippet chunks; shows up in raw engine messages.
const CHUNK_NAME: &str = "=snippet";

/// The deadline is checked every this many VM instructions.
const HOOK_INSTRUCTIONS: u32 = 1_000;

/// Deepest table nesting converted back into a [`ScriptValue`].
const MAX_DEPTH: usize = 64;

/// Base-library globals copied into the sandbox.
const SAFE_GLOBALS: &[&str] = &[
    "_VERSION",
    "assert",
    "error",
    "getmetatable",
    "ipairs",
    "next",
    "pairs",
    "pcall",
    "rawequal",
    "rawget",
    "rawlen",
    "rawset",
    "select",
    "setmetatable",
    "tonumber",
    "tostring",
    "type",
    "xpcall",
    "coroutine",
    "math",
    "string",
    "table",
    "utf8",
];

/// Names that resolve to nil instead of raising "not defined".
const NIL_NAMES: &[&str] = &["null", "undefined"];

pub const TIMEOUT_MESSAGE: &str = "Script execution timed out";

// ── LuaSession ────────────────────────────────────────────────────────────────

/// A single-use Lua interpreter with the sandbox pre-registered.
pub struct LuaSession {
    lua: Lua,
    env: LuaTable,
    timed_out: Rc<Cell<bool>>,
}

impl LuaSession {
    /// Create a sandbox whose `console` forwards to `console` and which
    /// aborts execution once `deadline` has passed.
    pub fn new(console: Arc<dyn Console>, deadline: Instant) -> LuaResult<Self> {
        let libs = StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8 | StdLib::COROUTINE;
        let lua = Lua::new_with(libs, LuaOptions::default())?;

        let base = Self::sandbox_globals(&lua, console)?;
        let env = lua.create_table()?;
        let env_meta = lua.create_table()?;
        env_meta.set("__index", base)?;
        env.set_metatable(Some(env_meta));

        let timed_out = Rc::new(Cell::new(false));
        let flag = Rc::clone(&timed_out);
        lua.set_hook(
            HookTriggers::new().every_nth_instruction(HOOK_INSTRUCTIONS),
            move |_lua, _debug| {
                if Instant::now() < deadline {
                    return Ok(VmState::Continue);
                }
                flag.set(true);
                Err(LuaError::RuntimeError(TIMEOUT_MESSAGE.to_owned()))
            },
        );

        Ok(LuaSession { lua, env, timed_out })
    }

    // ── Sandbox construction ──────────────────────────────────────────────

    /// Build the read-only fallback table behind every snippet's globals.
    fn sandbox_globals(lua: &Lua, console: Arc<dyn Console>) -> LuaResult<LuaTable> {
        let globals = lua.globals();
        let base = lua.create_table()?;
        for &name in SAFE_GLOBALS {
            let value: LuaValue = globals.get(name)?;
            base.raw_set(name, value)?;
        }

        // console.<level>(…) → Console::log
        let console_tbl = lua.create_table()?;
        for level in LogLevel::ALL {
            let console = Arc::clone(&console);
            let func = lua.create_function(move |_, args: Variadic<LuaValue>| {
                let message = args
                    .iter()
                    .map(|v| to_script(v).to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                console.log(level, &message);
                Ok(())
            })?;
            if level == LogLevel::Log {
                base.raw_set("print", func.clone())?;
            }
            console_tbl.raw_set(level.method_name(), func)?;
        }
        base.raw_set("console", console_tbl)?;

        // Unbound globals are an error, except the nil aliases.
        let strict = lua.create_function(|_, (_tbl, key): (LuaTable, LuaValue)| {
            let name = match &key {
                LuaValue::String(s) => String::from(s.to_string_lossy()),
                other => other.type_name().to_owned(),
            };
            if NIL_NAMES.contains(&name.as_str()) {
                return Ok(LuaValue::Nil);
            }
            Err(LuaError::RuntimeError(format!("{name} is not defined")))
        })?;
        let base_meta = lua.create_table()?;
        base_meta.set("__index", strict)?;
        base.set_metatable(Some(base_meta));

        Ok(base)
    }

    // ── Bindings ──────────────────────────────────────────────────────────

    /// Bind `name` in the snippet's global scope.
    pub fn bind(&self, name: &str, value: &ScriptValue) -> LuaResult<()> {
        let value = to_lua(&self.lua, value)?;
        self.env.raw_set(name, value)
    }

    /// Every global the snippet scope currently holds.
    pub fn bindings(&self) -> LuaResult<BTreeMap<String, ScriptValue>> {
        let mut out = BTreeMap::new();
        self.env.for_each(|key: LuaValue, value: LuaValue| {
            if let LuaValue::String(name) = key {
                out.insert(String::from(name.to_string_lossy()), to_script(&value));
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// `true` once the deadline hook has fired.
    pub fn timed_out(&self) -> bool {
        self.timed_out.get()
    }

    // ── Execution ─────────────────────────────────────────────────────────

    /// Run `snippet` and return the value of its last expression.
    ///
    /// A snippet returning nothing yields [`ScriptValue::Undefined`].
    pub fn run(&self, snippet: &str) -> LuaResult<ScriptValue> {
        let func = self.compile(snippet)?;
        let results: LuaMultiValue = func.call(())?;
        Ok(results
            .into_iter()
            .next()
            .map_or(ScriptValue::Undefined, |v| to_script(&v)))
    }

    /// Pick the first form of `snippet` that compiles:
    ///
    /// 1. `return <snippet>` (a single expression);
    /// 2. `<head>\nreturn <tail>`, splitting at each `;` or line break from
    ///    the last one backwards (statements, then a final expression);
    /// 3. the snippet as a plain chunk.
    ///
    /// A single-statement snippet that compiles in neither form reports the
    /// expression form's error (`1 +` fails near `<eof>`).
    fn compile(&self, snippet: &str) -> LuaResult<LuaFunction> {
        let expr_err = match self.load(&format!("return {snippet}")) {
            Ok(func) => return Ok(func),
            Err(e) => e,
        };
        let boundaries = statement_boundaries(snippet);
        if boundaries.is_empty() {
            return self.load(snippet).map_err(|_| expr_err);
        }
        for split in boundaries.into_iter().rev() {
            let (head, tail) = snippet.split_at(split);
            let tail = tail.trim();
            if tail.is_empty() {
                continue;
            }
            if let Ok(func) = self.load(&format!("{head}\nreturn {tail}")) {
                return Ok(func);
            }
        }
        self.load(snippet)
    }

    fn load(&self, source: &str) -> LuaResult<LuaFunction> {
        self.lua
            .load(source)
            .set_name(CHUNK_NAME)
            .set_environment(self.env.clone())
            .into_function()
    }
}

/// Byte offsets just past each `;` or `\n` in `snippet`.
fn statement_boundaries(snippet: &str) -> Vec<usize> {
    snippet
        .char_indices()
        .filter(|&(_, c)| c == ';' || c == '\n')
        .map(|(i, c)| i + c.len_utf8())
        .collect()
}

// ── Conversions ───────────────────────────────────────────────────────────────

/// Convert a [`ScriptValue`] into a Lua value.  Function references and
/// opaque values cannot cross back into the engine and become nil.
pub fn to_lua(lua: &Lua, value: &ScriptValue) -> LuaResult<LuaValue> {
    Ok(match value {
        ScriptValue::Null | ScriptValue::Undefined => LuaValue::Nil,
        ScriptValue::Bool(b) => LuaValue::Boolean(*b),
        ScriptValue::Integer(n) => LuaValue::Integer(*n),
        ScriptValue::Float(x) => LuaValue::Number(*x),
        ScriptValue::Str(s) => LuaValue::String(lua.create_string(s)?),
        ScriptValue::Sequence(items) => {
            let tbl = lua.create_table()?;
            for (i, item) in items.iter().enumerate() {
                tbl.raw_set(i as i64 + 1, to_lua(lua, item)?)?;
            }
            LuaValue::Table(tbl)
        }
        ScriptValue::Mapping(map) => {
            let tbl = lua.create_table()?;
            for (k, v) in map {
                tbl.raw_set(k.as_str(), to_lua(lua, v)?)?;
            }
            LuaValue::Table(tbl)
        }
        ScriptValue::Function(_) | ScriptValue::Opaque(_) => LuaValue::Nil,
    })
}

/// Convert a Lua value into a [`ScriptValue`].
pub fn to_script(value: &LuaValue) -> ScriptValue {
    let mut path = Vec::new();
    convert(value, &mut path)
}

fn convert(value: &LuaValue, path: &mut Vec<*const c_void>) -> ScriptValue {
    match value {
        LuaValue::Nil => ScriptValue::Null,
        LuaValue::Boolean(b) => ScriptValue::Bool(*b),
        LuaValue::Integer(n) => ScriptValue::Integer(*n),
        LuaValue::Number(x) => ScriptValue::Float(*x),
        LuaValue::String(s) => ScriptValue::Str(String::from(s.to_string_lossy())),
        LuaValue::Function(_) => ScriptValue::Function(format!("function: {:p}", value.to_pointer())),
        LuaValue::Table(tbl) => {
            let ptr = value.to_pointer();
            if path.contains(&ptr) {
                return ScriptValue::Opaque(format!("table: {ptr:p} (cycle)"));
            }
            if path.len() >= MAX_DEPTH {
                return ScriptValue::Opaque(format!("table: {ptr:p} (nested too deeply)"));
            }
            path.push(ptr);
            let converted = convert_table(tbl, path);
            path.pop();
            converted.unwrap_or_else(|e| ScriptValue::Opaque(format!("table: {e}")))
        }
        other => ScriptValue::Opaque(other.type_name().to_owned()),
    }
}

fn convert_table(tbl: &LuaTable, path: &mut Vec<*const c_void>) -> LuaResult<ScriptValue> {
    let mut entries: Vec<(LuaValue, LuaValue)> = Vec::new();
    tbl.for_each(|k: LuaValue, v: LuaValue| {
        entries.push((k, v));
        Ok(())
    })?;

    let len = tbl.raw_len();
    let is_sequence = len > 0
        && entries.len() == len
        && entries
            .iter()
            .all(|(k, _)| matches!(k, LuaValue::Integer(i) if *i >= 1 && (*i as usize) <= len));

    if is_sequence {
        let mut items = Vec::with_capacity(len);
        for i in 1..=len {
            let item: LuaValue = tbl.raw_get(i as i64)?;
            items.push(convert(&item, path));
        }
        return Ok(ScriptValue::Sequence(items));
    }

    let mut map = BTreeMap::new();
    for (k, v) in &entries {
        map.insert(key_text(k), convert(v, path));
    }
    Ok(ScriptValue::Mapping(map))
}

fn key_text(key: &LuaValue) -> String {
    match key {
        LuaValue::String(s) => String::from(s.to_string_lossy()),
        LuaValue::Integer(n) => n.to_string(),
        LuaValue::Number(x) => format_number(*x),
        LuaValue::Boolean(b) => b.to_string(),
        other => format!("{}: {:p}", other.type_name(), other.to_pointer()),
    }
}

// ── Error messages ────────────────────────────────────────────────────────────

const TRACEBACK: &str = "\nstack traceback:";

/// Human-readable message for an engine error, without the chunk/line prefix
/// or the traceback.
pub fn error_message(err: &LuaError) -> String {
    let raw = match err {
        LuaError::CallbackError { cause, .. } => return error_message(cause),
        LuaError::SyntaxError { message, .. } => message.clone(),
        LuaError::RuntimeError(message) => message.clone(),
        other => other.to_string(),
    };
    let raw = raw.split_once(TRACEBACK).map_or(raw.as_str(), |(head, _)| head);
    let message = strip_location(raw).trim().to_owned();
    if message.is_empty() {
        "unknown error".to_owned()
    } else {
        message
    }
}

fn strip_location(message: &str) -> String {
    static LOCATION: OnceLock<Option<Regex>> = OnceLock::new();
    let re = LOCATION.get_or_init(|| Regex::new(r#"(?m)^(?:snippet|\[string "[^"]*"\]):\d+: "#).ok());
    match re {
        Some(re) => re.replace_all(message, "").into_owned(),
        None => message.to_owned(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
