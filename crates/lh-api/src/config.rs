use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lh_core::HostError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RELOAD_DEBOUNCE_MS: u64 = 1400;

fn default_reload_debounce_ms() -> u64 {
    DEFAULT_RELOAD_DEBOUNCE_MS
}

/// Where a component reads its script text from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ScriptSource {
    /// Text held in the configuration and edited in place.
    Literal { text: String },
    /// A script file, re-read on every build.
    File { path: PathBuf },
}

impl ScriptSource {
    pub fn load(&self) -> Result<String, HostError> {
        match self {
            Self::Literal { text } => Ok(text.clone()),
            Self::File { path } => fs::read_to_string(path).map_err(|error| {
                HostError::new(
                    "SOURCE_READ",
                    format!("Failed to read script \"{}\": {}", path.display(), error),
                )
            }),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionContext {
    /// Interactive editing. `EditorOnly` functions run and source edits
    /// reload without delay.
    Editor,
    #[default]
    Playing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    pub name: String,
    pub source: ScriptSource,
    #[serde(default)]
    pub context: ExecutionContext,
    #[serde(default = "default_reload_debounce_ms")]
    pub reload_debounce_ms: u64,
    /// Values for `#Exposed` globals, keyed by variable name.
    #[serde(default)]
    pub initial_values: BTreeMap<String, serde_json::Value>,
}

impl ComponentConfig {
    pub fn literal(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_source(name, ScriptSource::Literal { text: text.into() })
    }

    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::with_source(name, ScriptSource::File { path: path.into() })
    }

    fn with_source(name: impl Into<String>, source: ScriptSource) -> Self {
        Self {
            name: name.into(),
            source,
            context: ExecutionContext::default(),
            reload_debounce_ms: DEFAULT_RELOAD_DEBOUNCE_MS,
            initial_values: BTreeMap::new(),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, HostError> {
        serde_json::from_str(text).map_err(|error| {
            HostError::new(
                "CONFIG_INVALID",
                format!("Invalid component config: {}", error),
            )
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, HostError> {
        let text = fs::read_to_string(path).map_err(|error| {
            HostError::new(
                "CONFIG_READ",
                format!("Failed to read config \"{}\": {}", path.display(), error),
            )
        })?;
        Self::from_json_str(&text)
    }

    pub fn reload_debounce(&self) -> Duration {
        Duration::from_millis(self.reload_debounce_ms)
    }

    pub fn is_editor(&self) -> bool {
        self.context == ExecutionContext::Editor
    }
}
