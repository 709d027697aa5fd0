use std::path::PathBuf;

use lh_core::EncodedVariable;
use serde::{Deserialize, Serialize};

pub(crate) const HOST_STATE_SCHEMA: &str = "lua-host-state.v1";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScript {
    /// File stem, used as the script and chunk name.
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) source: String,
}

/// `#Serialize` globals persisted between `run` invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HostState {
    pub(crate) schema_version: String,
    pub(crate) script: String,
    pub(crate) variables: Vec<EncodedVariable>,
}

impl HostState {
    pub(crate) fn new(script: String, variables: Vec<EncodedVariable>) -> Self {
        Self {
            schema_version: HOST_STATE_SCHEMA.to_string(),
            script,
            variables,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CheckStatus {
    Ok { functions: usize },
    Failed { code: String, message: String },
}

#[derive(Debug, Clone)]
pub(crate) struct CheckEntry {
    pub(crate) relative_path: String,
    pub(crate) status: CheckStatus,
}
