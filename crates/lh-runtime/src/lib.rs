pub mod instance;
pub mod interpreter;
pub mod lua;
pub mod registry;
pub mod snapshot;

pub use instance::{CallOutcome, ScriptInstance, ScriptInstanceOptions};
pub use interpreter::{
    EmptyHostFunctionRegistry, HostFunctionRegistry, HostFunctions, Interpreter,
};
pub use lua::LuaInterpreter;
pub use registry::{FunctionHandle, FunctionRegistry};
pub use snapshot::{
    capture_variables, decode_value, encode_value, restore_variables, VariableSnapshotStore,
};
