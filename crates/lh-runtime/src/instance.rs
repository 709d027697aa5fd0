use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use lh_core::{FunctionDecl, HostError, ScriptValue};
use lh_parser::{preprocess, TagIndex};
use tracing::{debug, error};

use crate::interpreter::{EmptyHostFunctionRegistry, HostFunctionRegistry, Interpreter};
use crate::lua::LuaInterpreter;
use crate::registry::{FunctionHandle, FunctionRegistry};

#[derive(Clone)]
pub struct ScriptInstanceOptions {
    pub name: String,
    pub source: String,
    pub host_functions: Option<Arc<dyn HostFunctionRegistry>>,
}

impl ScriptInstanceOptions {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            host_functions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The function ran to the end. Its return value is dropped.
    Completed,
    /// No function with that name and argument count. Not an error.
    Missing,
    Failed(HostError),
}

/// One compiled script together with its function registry and tag index.
///
/// Built once per activation; dropping it releases the interpreter.
pub struct ScriptInstance<I: Interpreter = LuaInterpreter> {
    name: String,
    interpreter: I,
    declarations: Vec<FunctionDecl>,
    registry: FunctionRegistry<I::Function>,
    tag_index: TagIndex,
}

impl ScriptInstance<LuaInterpreter> {
    pub fn new(name: impl Into<String>, source: &str) -> Result<Self, HostError> {
        Self::build(ScriptInstanceOptions::new(name, source))
    }

    pub fn with_options(options: ScriptInstanceOptions) -> Result<Self, HostError> {
        Self::build(options)
    }
}

impl<I: Interpreter> ScriptInstance<I> {
    pub fn build(options: ScriptInstanceOptions) -> Result<Self, HostError> {
        let preprocessed = preprocess(&options.source);
        let host_functions = options
            .host_functions
            .unwrap_or_else(|| Arc::new(EmptyHostFunctionRegistry::default()));
        let interpreter = I::compile(&options.name, &preprocessed.source, host_functions)?;
        let registry = FunctionRegistry::build(&preprocessed.declarations, &interpreter);

        let mut tag_index = preprocessed.tags;
        tag_index.retain_functions(|function| registry.contains_name(function));

        debug!(
            target: "scripting",
            "Built script \"{}\" with {} function(s) and {} tag(s)",
            options.name,
            registry.len(),
            tag_index.tags.len()
        );

        Ok(Self {
            name: options.name,
            interpreter,
            declarations: preprocessed.declarations,
            registry,
            tag_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn declarations(&self) -> &[FunctionDecl] {
        &self.declarations
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tag_index.tags
    }

    pub fn function_names(&self) -> &BTreeSet<String> {
        self.registry.names()
    }

    pub fn function_to_tags(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.tag_index.function_to_tags
    }

    pub fn tag_to_functions(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.tag_index.tag_to_functions
    }

    pub fn has_tag(&self, function: &str, tag: &str) -> bool {
        self.tag_index.has_tag(function, tag)
    }

    pub fn functions_with_tag(&self, tag: &str) -> Vec<&str> {
        self.tag_index.functions_with_tag(tag)
    }

    pub fn tags_of(&self, function: &str) -> Vec<&str> {
        self.tag_index.tags_of(function)
    }

    pub fn try_get_function(&self, name: &str, arity: usize) -> Option<&FunctionHandle<I::Function>> {
        self.registry.try_get(name, arity)
    }

    /// Calls the function registered under `name` with exactly `args.len()`
    /// parameters. A missing function is a caller bug and fails with
    /// `FUNCTION_NOT_FOUND`.
    pub fn call(&self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, HostError> {
        let handle = self
            .registry
            .try_get(name, args.len())
            .ok_or_else(|| HostError::function_not_found(&self.name, name, args.len()))?;
        self.interpreter.call(&handle.callable, args)
    }

    pub fn try_call_outcome(&self, name: &str, args: &[ScriptValue]) -> CallOutcome {
        let Some(handle) = self.registry.try_get(name, args.len()) else {
            return CallOutcome::Missing;
        };

        match self.interpreter.run(&handle.callable, args) {
            Ok(()) => CallOutcome::Completed,
            Err(failure) => {
                error!(
                    target: "scripting",
                    "Exception when trying to invoke {}.{}: {}",
                    self.name,
                    name,
                    failure
                );
                CallOutcome::Failed(failure)
            }
        }
    }

    /// Like [`Self::call`] but never propagates: runtime errors are logged,
    /// a missing function is silently skipped.
    pub fn try_call(&self, name: &str, args: &[ScriptValue]) -> bool {
        matches!(self.try_call_outcome(name, args), CallOutcome::Completed)
    }

    /// Invokes every function tagged `tag`, each isolated from the others'
    /// failures. Returns how many completed.
    pub fn call_with_tag(&self, tag: &str, args: &[ScriptValue]) -> usize {
        self.functions_with_tag(tag)
            .into_iter()
            .filter(|function| self.try_call(function, args))
            .count()
    }

    pub fn global(&self, name: &str) -> Result<ScriptValue, HostError> {
        self.interpreter.global(name)
    }

    pub fn set_global(&self, name: &str, value: &ScriptValue) -> Result<(), HostError> {
        self.interpreter.set_global(name, value)
    }

    pub fn dispose(self) {
        debug!(target: "scripting", "Disposing script \"{}\"", self.name);
    }
}
