use std::collections::BTreeMap;
use std::sync::Arc;

use lh_core::{HostError, ScriptValue};

/// The embedded language engine a [`crate::ScriptInstance`] drives.
///
/// Dropping the interpreter releases it.
pub trait Interpreter: Sized {
    type Function: Clone;

    /// Compiles and runs the top level of `source`. Every name exposed by
    /// `host_functions` is callable from the script.
    fn compile(
        chunk_name: &str,
        source: &str,
        host_functions: Arc<dyn HostFunctionRegistry>,
    ) -> Result<Self, HostError>;

    /// Global function named `name`, if the global holds a function.
    fn function(&self, name: &str) -> Option<Self::Function>;

    /// Runs `function` and converts its return value. A function that ran
    /// but returned something without a [`ScriptValue`] form fails with
    /// `RETURN_UNSUPPORTED`.
    fn call(&self, function: &Self::Function, args: &[ScriptValue])
        -> Result<ScriptValue, HostError>;

    /// Runs `function` and drops whatever it returns.
    fn run(&self, function: &Self::Function, args: &[ScriptValue]) -> Result<(), HostError>;

    fn global(&self, name: &str) -> Result<ScriptValue, HostError>;

    fn set_global(&self, name: &str, value: &ScriptValue) -> Result<(), HostError>;
}

pub trait HostFunctionRegistry: Send + Sync {
    fn call(&self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, HostError>;
    fn names(&self) -> &[String];
}

#[derive(Debug, Default)]
pub struct EmptyHostFunctionRegistry {
    names: Vec<String>,
}

impl HostFunctionRegistry for EmptyHostFunctionRegistry {
    fn call(&self, _name: &str, _args: &[ScriptValue]) -> Result<ScriptValue, HostError> {
        Err(HostError::new(
            "HOST_FUNCTION_MISSING",
            "Host function registry is empty.",
        ))
    }

    fn names(&self) -> &[String] {
        &self.names
    }
}

type HostFunction = Box<dyn Fn(&[ScriptValue]) -> Result<ScriptValue, HostError> + Send + Sync>;

/// Host functions registered once at start-up and shared by every script
/// instance built with them.
#[derive(Default)]
pub struct HostFunctions {
    names: Vec<String>,
    functions: BTreeMap<String, HostFunction>,
}

impl HostFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` under `name`. The first registration of a name wins.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[ScriptValue]) -> Result<ScriptValue, HostError> + Send + Sync + 'static,
    {
        let name = name.into();
        if !self.functions.contains_key(&name) {
            self.names.push(name.clone());
            self.functions.insert(name, Box::new(function));
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn into_registry(self) -> Arc<dyn HostFunctionRegistry> {
        Arc::new(self)
    }
}

impl HostFunctionRegistry for HostFunctions {
    fn call(&self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, HostError> {
        let Some(function) = self.functions.get(name) else {
            return Err(HostError::new(
                "HOST_FUNCTION_MISSING",
                format!("Host function \"{}\" is not registered.", name),
            ));
        };
        function(args).map_err(|error| {
            HostError::new(
                "HOST_FUNCTION_ERROR",
                format!("Host function \"{}\" failed: {}", name, error),
            )
        })
    }

    fn names(&self) -> &[String] {
        &self.names
    }
}
