use serde::{Deserialize, Serialize};

use crate::value::HostRef;

/// A `function name(...)` line found in script source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub arity: usize,
    /// 1-based line in the source as written, before tag lines are stripped.
    pub line: usize,
}

/// A global marked with `#Exposed <type>=<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposedVariable {
    pub type_name: String,
    pub name: String,
}

/// Persistable form of a captured global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedVariable {
    pub name: String,
    pub type_descriptor: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SerializedVariable {
    /// Host object reference, carried as-is so identity survives the round trip.
    Native { name: String, value: HostRef },
    Encoded(EncodedVariable),
}

impl SerializedVariable {
    pub fn name(&self) -> &str {
        match self {
            Self::Native { name, .. } => name,
            Self::Encoded(encoded) => &encoded.name,
        }
    }
}
