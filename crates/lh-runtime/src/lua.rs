use std::collections::BTreeMap;
use std::sync::Arc;

use lh_core::error::{
    RETURN_UNSUPPORTED, SCRIPT_COMPILE_ERROR, SCRIPT_LOAD_ERROR, SCRIPT_RUNTIME_ERROR,
};
use lh_core::{HostError, HostRef, ScriptValue};
use mlua::{Function, Lua, MultiValue, Table, UserData, Value};

use crate::interpreter::{HostFunctionRegistry, Interpreter};

const MAX_VALUE_DEPTH: usize = 64;

/// Userdata wrapper that carries a [`HostRef`] through Lua unchanged.
struct LuaHostRef(HostRef);

impl UserData for LuaHostRef {}

/// Lua 5.4 state behind a script instance.
pub struct LuaInterpreter {
    lua: Lua,
    chunk_name: String,
}

impl LuaInterpreter {
    pub fn chunk_name(&self) -> &str {
        &self.chunk_name
    }

    /// Evaluates a snippet against the script's globals.
    pub fn eval(&self, code: &str) -> Result<ScriptValue, HostError> {
        let value = self
            .lua
            .load(code)
            .set_name(format!("={}:eval", self.chunk_name))
            .eval::<Value>()
            .map_err(runtime_error)?;
        lua_to_script_value(value)
    }

    fn arguments(&self, args: &[ScriptValue]) -> Result<MultiValue, HostError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(script_value_to_lua(&self.lua, arg).map_err(value_error)?);
        }
        Ok(MultiValue::from_vec(values))
    }
}

impl Interpreter for LuaInterpreter {
    type Function = Function;

    fn compile(
        chunk_name: &str,
        source: &str,
        host_functions: Arc<dyn HostFunctionRegistry>,
    ) -> Result<Self, HostError> {
        let lua = Lua::new();
        register_host_functions(&lua, &host_functions).map_err(|error| {
            HostError::new("HOST_FUNCTION_REGISTER", error.to_string())
        })?;

        lua.load(source)
            .set_name(format!("={}", chunk_name))
            .exec()
            .map_err(load_error)?;

        Ok(Self {
            lua,
            chunk_name: chunk_name.to_string(),
        })
    }

    fn function(&self, name: &str) -> Option<Function> {
        match self.lua.globals().get::<Value>(name) {
            Ok(Value::Function(function)) => Some(function),
            _ => None,
        }
    }

    fn call(&self, function: &Function, args: &[ScriptValue]) -> Result<ScriptValue, HostError> {
        let result = function
            .call::<Value>(self.arguments(args)?)
            .map_err(runtime_error)?;
        lua_to_script_value(result).map_err(|error| {
            HostError::new(
                RETURN_UNSUPPORTED,
                format!("Return value has no host form: {}", error.message),
            )
        })
    }

    fn run(&self, function: &Function, args: &[ScriptValue]) -> Result<(), HostError> {
        function
            .call::<MultiValue>(self.arguments(args)?)
            .map(drop)
            .map_err(runtime_error)
    }

    fn global(&self, name: &str) -> Result<ScriptValue, HostError> {
        let value = self
            .lua
            .globals()
            .get::<Value>(name)
            .map_err(value_error)?;
        lua_to_script_value(value)
    }

    fn set_global(&self, name: &str, value: &ScriptValue) -> Result<(), HostError> {
        let value = script_value_to_lua(&self.lua, value).map_err(value_error)?;
        self.lua
            .globals()
            .set(name, value)
            .map_err(|error| HostError::new("SCRIPT_GLOBAL_ERROR", error.to_string()))
    }
}

fn register_host_functions(
    lua: &Lua,
    registry: &Arc<dyn HostFunctionRegistry>,
) -> mlua::Result<()> {
    let globals = lua.globals();
    for name in registry.names() {
        let registry = Arc::clone(registry);
        let function_name = name.clone();
        let function = lua.create_function(move |lua, args: MultiValue| {
            let args = args
                .into_iter()
                .map(lua_to_script_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| mlua::Error::RuntimeError(error.to_string()))?;
            let result = registry
                .call(&function_name, &args)
                .map_err(|error| mlua::Error::RuntimeError(error.to_string()))?;
            script_value_to_lua(lua, &result)
        })?;
        globals.set(name.as_str(), function)?;
    }
    Ok(())
}

fn load_error(error: mlua::Error) -> HostError {
    match error {
        mlua::Error::SyntaxError { message, .. } => HostError::new(SCRIPT_COMPILE_ERROR, message),
        other => HostError::new(SCRIPT_LOAD_ERROR, other.to_string()),
    }
}

fn runtime_error(error: mlua::Error) -> HostError {
    HostError::new(SCRIPT_RUNTIME_ERROR, error.to_string())
}

fn value_error(error: mlua::Error) -> HostError {
    HostError::new("VALUE_UNSUPPORTED", error.to_string())
}

fn unsupported(what: &str) -> HostError {
    HostError::new(
        "VALUE_UNSUPPORTED",
        format!("Lua value of type {} cannot leave the interpreter.", what),
    )
}

pub(crate) fn lua_to_script_value(value: Value) -> Result<ScriptValue, HostError> {
    convert_lua_value(value, 0)
}

fn convert_lua_value(value: Value, depth: usize) -> Result<ScriptValue, HostError> {
    if depth > MAX_VALUE_DEPTH {
        return Err(HostError::new(
            "VALUE_DEPTH",
            format!("Table nesting exceeds {} levels.", MAX_VALUE_DEPTH),
        ));
    }

    match value {
        Value::Nil => Ok(ScriptValue::Nil),
        Value::Boolean(value) => Ok(ScriptValue::Boolean(value)),
        Value::Integer(value) => Ok(ScriptValue::Integer(value)),
        Value::Number(value) => Ok(ScriptValue::Number(value)),
        Value::String(value) => Ok(ScriptValue::String(
            value.to_str().map_err(value_error)?.to_string(),
        )),
        Value::Table(table) => table_to_script_value(&table, depth),
        Value::UserData(userdata) => match userdata.borrow::<LuaHostRef>() {
            Ok(host) => Ok(ScriptValue::Host(host.0.clone())),
            Err(_) => Err(unsupported("userdata")),
        },
        other => Err(unsupported(other.type_name())),
    }
}

/// Sequences (keys exactly `1..=n`) become arrays, string-keyed tables
/// become maps. Anything else is rejected.
fn table_to_script_value(table: &Table, depth: usize) -> Result<ScriptValue, HostError> {
    let mut entries = Vec::new();
    for pair in table.pairs::<Value, Value>() {
        entries.push(pair.map_err(value_error)?);
    }

    let length = table.raw_len();
    let is_sequence = length > 0
        && entries.len() == length
        && entries.iter().all(|(key, _)| {
            matches!(key, Value::Integer(index) if *index >= 1 && (*index as usize) <= length)
        });

    if is_sequence {
        entries.sort_by_key(|(key, _)| match key {
            Value::Integer(index) => *index,
            _ => 0,
        });
        let values = entries
            .into_iter()
            .map(|(_, value)| convert_lua_value(value, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ScriptValue::Array(values));
    }

    let mut map = BTreeMap::new();
    for (key, value) in entries {
        let key = match key {
            Value::String(key) => key.to_str().map_err(value_error)?.to_string(),
            other => {
                return Err(HostError::new(
                    "VALUE_UNSUPPORTED",
                    format!("Table key of type {} is not supported.", other.type_name()),
                ))
            }
        };
        map.insert(key, convert_lua_value(value, depth + 1)?);
    }
    Ok(ScriptValue::Map(map))
}

pub(crate) fn script_value_to_lua(lua: &Lua, value: &ScriptValue) -> mlua::Result<Value> {
    match value {
        ScriptValue::Nil => Ok(Value::Nil),
        ScriptValue::Boolean(value) => Ok(Value::Boolean(*value)),
        ScriptValue::Integer(value) => Ok(Value::Integer(*value)),
        ScriptValue::Number(value) => Ok(Value::Number(*value)),
        ScriptValue::String(value) => Ok(Value::String(lua.create_string(value)?)),
        ScriptValue::Array(values) => {
            let table = lua.create_table()?;
            for (index, value) in values.iter().enumerate() {
                table.raw_set(index as i64 + 1, script_value_to_lua(lua, value)?)?;
            }
            Ok(Value::Table(table))
        }
        ScriptValue::Map(values) => {
            let table = lua.create_table()?;
            for (key, value) in values {
                table.raw_set(key.as_str(), script_value_to_lua(lua, value)?)?;
            }
            Ok(Value::Table(table))
        }
        ScriptValue::Host(host) => Ok(Value::UserData(
            lua.create_userdata(LuaHostRef(host.clone()))?,
        )),
    }
}

#[cfg(test)]
mod lua_bridge_tests {
    use super::*;
    use crate::interpreter::{EmptyHostFunctionRegistry, HostFunctions};

    fn compile(source: &str) -> LuaInterpreter {
        LuaInterpreter::compile(
            "test",
            source,
            Arc::new(EmptyHostFunctionRegistry::default()),
        )
        .expect("source should compile")
    }

    #[test]
    fn syntax_errors_map_to_compile_error() {
        let error = LuaInterpreter::compile(
            "broken",
            "function oops(\n",
            Arc::new(EmptyHostFunctionRegistry::default()),
        )
        .err()
        .expect("syntax error expected");
        assert_eq!(error.code, SCRIPT_COMPILE_ERROR);
        assert!(error.message.contains("broken"));
    }

    #[test]
    fn top_level_errors_map_to_load_error() {
        let error = LuaInterpreter::compile(
            "raises",
            "error('at load')",
            Arc::new(EmptyHostFunctionRegistry::default()),
        )
        .err()
        .expect("load error expected");
        assert_eq!(error.code, SCRIPT_LOAD_ERROR);
        assert!(error.message.contains("at load"));
    }

    #[test]
    fn globals_convert_both_ways() {
        let interpreter = compile(
            r#"
count = 3
ratio = 0.25
name = "probe"
list = { 1, 2, "three" }
record = { hp = 10, alive = true }
"#,
        );
        assert_eq!(interpreter.global("count").expect("count"), ScriptValue::Integer(3));
        assert_eq!(interpreter.global("ratio").expect("ratio"), ScriptValue::Number(0.25));
        assert_eq!(interpreter.global("name").expect("name"), ScriptValue::from("probe"));
        assert_eq!(
            interpreter.global("list").expect("list"),
            ScriptValue::Array(vec![
                ScriptValue::Integer(1),
                ScriptValue::Integer(2),
                ScriptValue::from("three"),
            ])
        );
        assert_eq!(
            interpreter.global("record").expect("record"),
            ScriptValue::Map(BTreeMap::from([
                ("alive".to_string(), ScriptValue::Boolean(true)),
                ("hp".to_string(), ScriptValue::Integer(10)),
            ]))
        );
        assert_eq!(interpreter.global("missing").expect("missing"), ScriptValue::Nil);

        interpreter
            .set_global("record", &ScriptValue::Map(BTreeMap::from([(
                "hp".to_string(),
                ScriptValue::Integer(7),
            )])))
            .expect("set record");
        assert_eq!(
            interpreter.eval("return record.hp + 1").expect("eval"),
            ScriptValue::Integer(8)
        );
    }

    #[test]
    fn unsupported_values_are_rejected() {
        let interpreter = compile(
            "handler = function() end\nmixed = { [1] = 'a', [true] = 'b' }\nholes = { [1] = 'a', [3] = 'c' }",
        );
        assert_eq!(
            interpreter.global("handler").expect_err("function").code,
            "VALUE_UNSUPPORTED"
        );
        assert_eq!(
            interpreter.global("mixed").expect_err("boolean key").code,
            "VALUE_UNSUPPORTED"
        );
        assert_eq!(
            interpreter.global("holes").expect_err("integer keys with holes").code,
            "VALUE_UNSUPPORTED"
        );
    }

    #[test]
    fn self_referencing_tables_hit_depth_limit() {
        let interpreter = compile("loop = {}\nloop.self = loop");
        assert_eq!(
            interpreter.global("loop").expect_err("cycle").code,
            "VALUE_DEPTH"
        );
    }

    #[test]
    fn host_refs_keep_identity_through_lua() {
        let interpreter = compile("");
        let owner = HostRef::new(String::from("owner"));
        interpreter
            .set_global("owner", &ScriptValue::Host(owner.clone()))
            .expect("set owner");
        interpreter.eval("alias = owner").expect("alias");

        let back = interpreter.global("alias").expect("alias global");
        assert_eq!(back.as_host(), Some(&owner));
    }

    #[test]
    fn host_functions_are_callable_from_lua() {
        let mut functions = HostFunctions::new();
        functions.register("add", |args| {
            let sum = args.iter().filter_map(ScriptValue::as_integer).sum::<i64>();
            Ok(ScriptValue::Integer(sum))
        });
        let interpreter = LuaInterpreter::compile(
            "host",
            "total = add(1, 2, 3)",
            functions.into_registry(),
        )
        .expect("compile with host functions");
        assert_eq!(interpreter.global("total").expect("total"), ScriptValue::Integer(6));
    }

    #[test]
    fn call_passes_arguments_and_returns_first_result() {
        let interpreter = compile("function pair(a, b) return a .. b, 'ignored' end");
        let function = interpreter.function("pair").expect("pair");
        let result = interpreter
            .call(&function, &[ScriptValue::from("x"), ScriptValue::from("y")])
            .expect("call");
        assert_eq!(result, ScriptValue::from("xy"));
        assert!(interpreter.function("nothing").is_none());
    }
}
