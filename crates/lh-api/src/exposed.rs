use std::collections::BTreeMap;

use lh_core::{ExposedVariable, ScriptValue};
use lh_parser::{exposed_variables, malformed_exposed_tags};
use lh_runtime::{Interpreter, ScriptInstance};
use tracing::warn;

/// Sets every `#Exposed <type>=<name>` global to its configured initial
/// value, or to nil when none is configured.
pub fn initialize_exposed_variables<I: Interpreter>(
    instance: &ScriptInstance<I>,
    initial_values: &BTreeMap<String, serde_json::Value>,
) -> Vec<ExposedVariable> {
    for tag in malformed_exposed_tags(instance.tags()) {
        warn!(
            target: "scripting",
            "Incomplete exposed variable \"{}\" in \"{}\", expected #Exposed type=name",
            tag,
            instance.name()
        );
    }

    let variables = exposed_variables(instance.tags());
    for variable in &variables {
        let value = initial_values
            .get(&variable.name)
            .cloned()
            .map(ScriptValue::from_json)
            .unwrap_or(ScriptValue::Nil);
        if let Err(error) = instance.set_global(&variable.name, &value) {
            warn!(
                target: "scripting",
                "Could not initialise exposed {} {}.{}: {}",
                variable.type_name,
                instance.name(),
                variable.name,
                error
            );
        }
    }
    variables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposed_globals_take_initial_values_or_nil() {
        let instance = ScriptInstance::new(
            "exposed",
            "#Exposed number=speed\n#Exposed string=label\n#Exposed broken\nspeed = 1\nlabel = 'x'\n",
        )
        .expect("script should build");
        let initial = BTreeMap::from([("speed".to_string(), serde_json::json!(4))]);

        let variables = initialize_exposed_variables(&instance, &initial);

        assert_eq!(
            variables,
            vec![
                ExposedVariable {
                    type_name: "number".to_string(),
                    name: "speed".to_string(),
                },
                ExposedVariable {
                    type_name: "string".to_string(),
                    name: "label".to_string(),
                },
            ]
        );
        assert_eq!(instance.global("speed").expect("speed"), ScriptValue::Integer(4));
        assert_eq!(instance.global("label").expect("label"), ScriptValue::Nil);
    }
}
