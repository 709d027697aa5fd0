pub mod component;
pub mod config;
pub mod exposed;

use std::path::Path;

use lh_core::HostError;

pub use component::{
    ScriptComponent, AWAKE, FIXED_UPDATE, ON_DISABLE, ON_ENABLE, START, UPDATE,
};
pub use config::{ComponentConfig, ExecutionContext, ScriptSource, DEFAULT_RELOAD_DEBOUNCE_MS};
pub use exposed::initialize_exposed_variables;

/// Builds a component from a JSON config file and runs `awake`, `enable`
/// and `start` on it.
pub fn start_component_from_config_path(path: &Path) -> Result<ScriptComponent, HostError> {
    start_component(ComponentConfig::from_path(path)?)
}

pub fn start_component(config: ComponentConfig) -> Result<ScriptComponent, HostError> {
    let mut component = ScriptComponent::new(config);
    component.awake()?;
    component.enable()?;
    component.start();
    Ok(component)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use lh_core::{HostRef, ScriptValue};
    use lh_runtime::HostFunctions;

    use super::*;

    const LIFECYCLE: &str = r#"
log = ''
#Awake
function awake()
  log = log .. 'A'
end
#OnEnable
function on_enable()
  log = log .. 'E'
end
#Start
function start()
  log = log .. 'S'
end
#Update
function update()
  log = log .. 'U'
end
#FixedUpdate
function fixed_update()
  log = log .. 'F'
end
#Update, EditorOnly
function editor_update()
  log = log .. 'e'
end
"#;

    fn global(component: &ScriptComponent, name: &str) -> ScriptValue {
        component
            .instance()
            .expect("component should be active")
            .global(name)
            .expect("global should convert")
    }

    fn text(value: &str) -> ScriptValue {
        ScriptValue::String(value.to_string())
    }

    #[test]
    fn lifecycle_dispatches_in_order() {
        let mut component =
            start_component(ComponentConfig::literal("lifecycle", LIFECYCLE)).expect("start");
        component.update(Duration::from_millis(16)).expect("update");
        component.fixed_update();
        assert_eq!(global(&component, "log"), text("AESUF"));
        assert!(component.is_active());

        component.disable();
        assert!(!component.is_active());
        assert_eq!(component.dispatch_event(UPDATE), 0);
    }

    #[test]
    fn editor_only_handlers_run_only_in_editor() {
        let mut config = ComponentConfig::literal("lifecycle", LIFECYCLE);
        config.context = ExecutionContext::Editor;
        let mut component = start_component(config).expect("start");
        component.update(Duration::from_millis(16)).expect("update");

        let log = global(&component, "log");
        let log = log.as_str().expect("log is a string");
        assert!(log.starts_with("AES"));
        assert!(log.contains('U'));
        assert!(log.contains('e'));
    }

    #[test]
    fn serialized_variables_survive_reload() {
        let source = "#Serialize coins\ncoins = 0\n#Update\nfunction update()\n  coins = coins + 1\nend\n";
        let mut component =
            start_component(ComponentConfig::literal("coins", source)).expect("start");
        for _ in 0..3 {
            component.update(Duration::from_millis(16)).expect("update");
        }

        component.reload().expect("reload");
        assert_eq!(global(&component, "coins"), ScriptValue::Integer(3));
        assert!(component.snapshot().is_empty());
    }

    #[test]
    fn host_reference_bindings_keep_identity_across_reload() {
        let owner = HostRef::new(String::from("crate"));
        let mut component = ScriptComponent::new(ComponentConfig::literal(
            "owned",
            "#Serialize target\n#Awake\nfunction awake()\n  target = owner\nend\n",
        ));
        component.bind("owner", owner.clone());
        component.awake().expect("awake");
        component.enable().expect("enable");

        component.reload().expect("reload");
        let target = global(&component, "target");
        assert!(target.as_host().expect("host reference").ptr_eq(&owner));
    }

    #[test]
    fn literal_edits_reload_after_debounce_while_playing() {
        let mut config = ComponentConfig::literal("live", "value = 1\n");
        config.reload_debounce_ms = 100;
        let mut component = start_component(config).expect("start");

        assert!(component.set_source_text("value = 2\n"));
        assert!(!component.set_source_text("value = 2\n"));

        component.update(Duration::from_millis(60)).expect("update");
        component.update(Duration::from_millis(60)).expect("update");
        assert_eq!(global(&component, "value"), ScriptValue::Integer(1));
        assert!(component.reload_pending());

        component.update(Duration::from_millis(60)).expect("update");
        assert_eq!(global(&component, "value"), ScriptValue::Integer(2));
        assert!(!component.reload_pending());
    }

    #[test]
    fn literal_edits_reload_on_next_update_in_editor() {
        let mut config = ComponentConfig::literal("live", "value = 1\n");
        config.context = ExecutionContext::Editor;
        let mut component = start_component(config).expect("start");

        component.set_source_text("value = 5\n");
        component.update(Duration::ZERO).expect("update");
        assert_eq!(global(&component, "value"), ScriptValue::Integer(5));
    }

    #[test]
    fn broken_edit_leaves_component_inactive_until_fixed() {
        let mut config = ComponentConfig::literal("live", "value = 1\n");
        config.context = ExecutionContext::Editor;
        let mut component = start_component(config).expect("start");

        component.set_source_text("value = = 1\n");
        let error = component
            .update(Duration::ZERO)
            .expect_err("broken source should fail");
        assert_eq!(error.code, "SCRIPT_COMPILE_ERROR");
        assert!(!component.is_active());

        component.set_source_text("value = 3\n");
        component.enable().expect("enable after fix");
        assert_eq!(global(&component, "value"), ScriptValue::Integer(3));
    }

    #[test]
    fn exposed_variables_are_initialised_on_every_build() {
        let mut config = ComponentConfig::literal(
            "exposed",
            "#Exposed number=speed\n#Exposed Transform=target\n",
        );
        config.initial_values = BTreeMap::from([("speed".to_string(), serde_json::json!(7.5))]);
        let mut component = start_component(config).expect("start");

        assert_eq!(component.exposed_variables().len(), 2);
        assert_eq!(global(&component, "speed"), ScriptValue::Number(7.5));
        assert_eq!(global(&component, "target"), ScriptValue::Nil);

        component.reload().expect("reload");
        assert_eq!(global(&component, "speed"), ScriptValue::Number(7.5));
    }

    #[test]
    fn file_sources_reload_on_modification() {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("lh-api-{}.lua", stamp));
        fs::write(&path, "version = 1\n").expect("write script");

        let mut component =
            start_component(ComponentConfig::file("file", &path)).expect("start");
        assert_eq!(global(&component, "version"), ScriptValue::Integer(1));
        assert!(!component.set_source_text("version = 9\n"));

        fs::write(&path, "version = 2\n").expect("rewrite script");
        component.notify_source_modified().expect("reload");
        assert_eq!(global(&component, "version"), ScriptValue::Integer(2));

        fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn host_functions_reach_lifecycle_handlers() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut functions = HostFunctions::new();
        functions.register("emit", move |args| {
            if let Some(name) = args.first().and_then(ScriptValue::as_str) {
                sink.lock().expect("events lock").push(name.to_string());
            }
            Ok(ScriptValue::Nil)
        });

        let mut component = ScriptComponent::new(ComponentConfig::literal(
            "emitter",
            "#OnEnable\nfunction on_enable()\n  emit('enabled')\nend\n#Explode\nfunction boom()\n  error('x')\nend\n",
        ))
        .with_host_functions(functions.into_registry());
        component.enable().expect("enable");

        assert_eq!(component.dispatch_event("Explode"), 0);
        assert_eq!(*events.lock().expect("events lock"), vec!["enabled".to_string()]);
    }

    #[test]
    fn components_start_from_json_config_files() {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("lh-api-config-{}.json", stamp));
        fs::write(
            &path,
            r##"{
                "name": "configured",
                "source": {"mode": "literal", "text": "#Exposed number=speed\n"},
                "initialValues": {"speed": 3}
            }"##,
        )
        .expect("write config");

        let component = start_component_from_config_path(&path).expect("start from config");
        assert_eq!(component.config().name, "configured");
        assert_eq!(global(&component, "speed"), ScriptValue::Integer(3));
        assert!(component.bindings().is_empty());

        fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn call_on_inactive_component_fails() {
        let component = ScriptComponent::new(ComponentConfig::literal("idle", "function f() end\n"));
        let error = component.call("f", &[]).expect_err("inactive");
        assert_eq!(error.code, "COMPONENT_INACTIVE");
    }
}
