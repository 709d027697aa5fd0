use std::collections::{BTreeMap, BTreeSet};

use lh_core::FunctionDecl;
use tracing::debug;

use crate::interpreter::Interpreter;

#[derive(Debug, Clone)]
pub struct FunctionHandle<F> {
    pub name: String,
    /// Parameter count taken from the declaration, not from any call site.
    pub arity: usize,
    pub callable: F,
}

/// Compiled script functions keyed by name, then by declared arity.
#[derive(Debug, Clone)]
pub struct FunctionRegistry<F> {
    functions: BTreeMap<String, BTreeMap<usize, FunctionHandle<F>>>,
    names: BTreeSet<String>,
}

impl<F> Default for FunctionRegistry<F> {
    fn default() -> Self {
        Self {
            functions: BTreeMap::new(),
            names: BTreeSet::new(),
        }
    }
}

impl<F: Clone> FunctionRegistry<F> {
    /// Resolves each declaration against the interpreter's globals.
    /// Declarations that are not global functions (`local function`,
    /// methods on tables) are left out.
    pub fn build<I>(declarations: &[FunctionDecl], interpreter: &I) -> Self
    where
        I: Interpreter<Function = F>,
    {
        let mut registry = Self::default();
        for declaration in declarations {
            let Some(callable) = interpreter.function(&declaration.name) else {
                debug!(
                    target: "scripting",
                    "Declaration \"{}\" on line {} is not a global function, skipping",
                    declaration.name,
                    declaration.line
                );
                continue;
            };
            registry.insert(FunctionHandle {
                name: declaration.name.clone(),
                arity: declaration.arity,
                callable,
            });
        }
        registry
    }

    fn insert(&mut self, handle: FunctionHandle<F>) {
        self.names.insert(handle.name.clone());
        self.functions
            .entry(handle.name.clone())
            .or_default()
            .insert(handle.arity, handle);
    }

    pub fn try_get(&self, name: &str, arity: usize) -> Option<&FunctionHandle<F>> {
        self.functions.get(name)?.get(&arity)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn handles(&self) -> impl Iterator<Item = &FunctionHandle<F>> {
        self.functions.values().flat_map(BTreeMap::values)
    }

    pub fn len(&self) -> usize {
        self.functions.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
