use std::collections::BTreeMap;

use lh_core::{EncodedVariable, HostError, ScriptValue, SerializedVariable};
use lh_parser::serialized_variables;
use tracing::{debug, warn};

use crate::instance::ScriptInstance;
use crate::interpreter::Interpreter;

pub const TYPE_BOOLEAN: &str = "lua.boolean";
pub const TYPE_INTEGER: &str = "lua.integer";
pub const TYPE_NUMBER: &str = "lua.number";
pub const TYPE_STRING: &str = "lua.string";
pub const TYPE_ARRAY: &str = "lua.array";
pub const TYPE_MAP: &str = "lua.map";

fn encode_error(name: &str, error: impl std::fmt::Display) -> HostError {
    HostError::new(
        "SNAPSHOT_ENCODE",
        format!("Variable \"{}\" cannot be encoded: {}", name, error),
    )
}

fn decode_error(name: &str, error: impl std::fmt::Display) -> HostError {
    HostError::new(
        "SNAPSHOT_DECODE",
        format!("Variable \"{}\" cannot be decoded: {}", name, error),
    )
}

/// JSON writes NaN and infinities as `null`, which would never decode back.
fn has_non_finite(value: &ScriptValue) -> bool {
    match value {
        ScriptValue::Number(number) => !number.is_finite(),
        ScriptValue::Array(values) => values.iter().any(has_non_finite),
        ScriptValue::Map(values) => values.values().any(has_non_finite),
        _ => false,
    }
}

pub fn encode_value(name: &str, value: &ScriptValue) -> Result<EncodedVariable, HostError> {
    if has_non_finite(value) {
        return Err(encode_error(name, "non-finite number"));
    }
    let (type_descriptor, payload) = match value {
        ScriptValue::Boolean(value) => (TYPE_BOOLEAN, serde_json::to_string(value)),
        ScriptValue::Integer(value) => (TYPE_INTEGER, serde_json::to_string(value)),
        ScriptValue::Number(value) => (TYPE_NUMBER, serde_json::to_string(value)),
        ScriptValue::String(value) => (TYPE_STRING, serde_json::to_string(value)),
        ScriptValue::Array(values) => (TYPE_ARRAY, serde_json::to_string(values)),
        ScriptValue::Map(values) => (TYPE_MAP, serde_json::to_string(values)),
        ScriptValue::Nil | ScriptValue::Host(_) => {
            return Err(encode_error(
                name,
                format!("{} values have no encoded form", value.type_name()),
            ))
        }
    };

    Ok(EncodedVariable {
        name: name.to_string(),
        type_descriptor: type_descriptor.to_string(),
        payload: payload.map_err(|error| encode_error(name, error))?,
    })
}

pub fn decode_value(encoded: &EncodedVariable) -> Result<ScriptValue, HostError> {
    let name = encoded.name.as_str();
    let payload = encoded.payload.as_str();
    let value = match encoded.type_descriptor.as_str() {
        TYPE_BOOLEAN => serde_json::from_str(payload).map(ScriptValue::Boolean),
        TYPE_INTEGER => serde_json::from_str(payload).map(ScriptValue::Integer),
        TYPE_NUMBER => serde_json::from_str(payload).map(ScriptValue::Number),
        TYPE_STRING => serde_json::from_str(payload).map(ScriptValue::String),
        TYPE_ARRAY => serde_json::from_str(payload).map(ScriptValue::Array),
        TYPE_MAP => serde_json::from_str::<BTreeMap<String, ScriptValue>>(payload)
            .map(ScriptValue::Map),
        other => {
            return Err(HostError::new(
                "SNAPSHOT_TYPE_UNKNOWN",
                format!("Variable \"{}\" has unknown type \"{}\".", name, other),
            ))
        }
    };
    value.map_err(|error| decode_error(name, error))
}

/// Reads every global named by a `#Serialize <name>` tag.
///
/// Host references are kept as-is, nil values are skipped, and values that
/// cannot be read or encoded are skipped with a warning.
pub fn capture_variables<I: Interpreter>(instance: &ScriptInstance<I>) -> Vec<SerializedVariable> {
    let mut captured = Vec::new();
    for name in serialized_variables(instance.tags()) {
        let value = match instance.global(&name) {
            Ok(value) => value,
            Err(error) => {
                warn!(
                    target: "scripting",
                    "Skipping serialized variable {}.{}: {}",
                    instance.name(),
                    name,
                    error
                );
                continue;
            }
        };

        match value {
            ScriptValue::Nil => continue,
            ScriptValue::Host(value) => captured.push(SerializedVariable::Native { name, value }),
            value => match encode_value(&name, &value) {
                Ok(encoded) => captured.push(SerializedVariable::Encoded(encoded)),
                Err(error) => warn!(
                    target: "scripting",
                    "Skipping serialized variable {}.{}: {}",
                    instance.name(),
                    name,
                    error
                ),
            },
        }
    }
    captured
}

/// Writes captured variables into `instance`. A variable that fails to
/// decode is skipped without affecting the rest. Returns how many were set.
pub fn restore_variables<I: Interpreter>(
    instance: &ScriptInstance<I>,
    variables: Vec<SerializedVariable>,
) -> usize {
    let mut restored = 0;
    for variable in variables {
        let (name, value) = match variable {
            SerializedVariable::Native { name, value } => (name, ScriptValue::Host(value)),
            SerializedVariable::Encoded(encoded) => match decode_value(&encoded) {
                Ok(value) => (encoded.name, value),
                Err(error) => {
                    warn!(
                        target: "scripting",
                        "Could not restore {}.{}: {}",
                        instance.name(),
                        encoded.name,
                        error
                    );
                    continue;
                }
            },
        };

        match instance.set_global(&name, &value) {
            Ok(()) => restored += 1,
            Err(error) => warn!(
                target: "scripting",
                "Could not restore {}.{}: {}",
                instance.name(),
                name,
                error
            ),
        }
    }
    restored
}

/// Holds the variables captured on deactivation until the next activation.
/// Each capture replaces the previous one and each restore empties the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSnapshotStore {
    variables: Vec<SerializedVariable>,
}

impl VariableSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_encoded(variables: Vec<EncodedVariable>) -> Self {
        Self {
            variables: variables
                .into_iter()
                .map(SerializedVariable::Encoded)
                .collect(),
        }
    }

    pub fn capture<I: Interpreter>(&mut self, instance: &ScriptInstance<I>) -> usize {
        self.variables = capture_variables(instance);
        debug!(
            target: "scripting",
            "Captured {} variable(s) from \"{}\"",
            self.variables.len(),
            instance.name()
        );
        self.variables.len()
    }

    pub fn restore<I: Interpreter>(&mut self, instance: &ScriptInstance<I>) -> usize {
        let variables = std::mem::take(&mut self.variables);
        restore_variables(instance, variables)
    }

    pub fn variables(&self) -> &[SerializedVariable] {
        &self.variables
    }

    /// The persistable part of the snapshot. Host references are left out.
    pub fn encoded(&self) -> Vec<EncodedVariable> {
        self.variables
            .iter()
            .filter_map(|variable| match variable {
                SerializedVariable::Encoded(encoded) => Some(encoded.clone()),
                SerializedVariable::Native { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn clear(&mut self) {
        self.variables.clear();
    }
}
