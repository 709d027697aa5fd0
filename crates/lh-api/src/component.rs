use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use lh_core::{EncodedVariable, ExposedVariable, HostError, ScriptValue};
use lh_parser::EDITOR_ONLY;
use lh_runtime::{HostFunctionRegistry, ScriptInstance, ScriptInstanceOptions, VariableSnapshotStore};
use tracing::{debug, info, warn};

use crate::config::{ComponentConfig, ScriptSource};
use crate::exposed::initialize_exposed_variables;

pub const AWAKE: &str = "Awake";
pub const ON_ENABLE: &str = "OnEnable";
pub const START: &str = "Start";
pub const UPDATE: &str = "Update";
pub const FIXED_UPDATE: &str = "FixedUpdate";
pub const ON_DISABLE: &str = "OnDisable";

/// Drives one script through the host object's lifecycle.
///
/// Holds at most one live [`ScriptInstance`]. Deactivation captures the
/// `#Serialize` globals and the next activation restores them into the
/// freshly built instance.
pub struct ScriptComponent {
    config: ComponentConfig,
    bindings: BTreeMap<String, ScriptValue>,
    host_functions: Option<Arc<dyn HostFunctionRegistry>>,
    instance: Option<ScriptInstance>,
    snapshot: VariableSnapshotStore,
    exposed: Vec<ExposedVariable>,
    pending_reload: Option<Duration>,
}

impl ScriptComponent {
    pub fn new(config: ComponentConfig) -> Self {
        Self {
            config,
            bindings: BTreeMap::new(),
            host_functions: None,
            instance: None,
            snapshot: VariableSnapshotStore::new(),
            exposed: Vec::new(),
            pending_reload: None,
        }
    }

    pub fn with_host_functions(mut self, host_functions: Arc<dyn HostFunctionRegistry>) -> Self {
        self.host_functions = Some(host_functions);
        self
    }

    /// Global set on every build, before exposed variables and snapshot restore.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<ScriptValue>) -> &mut Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    pub fn bindings(&self) -> &BTreeMap<String, ScriptValue> {
        &self.bindings
    }

    pub fn instance(&self) -> Option<&ScriptInstance> {
        self.instance.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.instance.is_some()
    }

    pub fn exposed_variables(&self) -> &[ExposedVariable] {
        &self.exposed
    }

    pub fn snapshot(&self) -> &VariableSnapshotStore {
        &self.snapshot
    }

    /// Seeds the snapshot store from persisted state, replacing whatever
    /// it held. Applied on the next activation.
    pub fn load_snapshot(&mut self, variables: Vec<EncodedVariable>) {
        self.snapshot = VariableSnapshotStore::from_encoded(variables);
    }

    pub fn reload_pending(&self) -> bool {
        self.pending_reload.is_some()
    }

    pub fn awake(&mut self) -> Result<(), HostError> {
        self.ensure_instance()?;
        self.dispatch(AWAKE, &[]);
        Ok(())
    }

    pub fn enable(&mut self) -> Result<(), HostError> {
        self.ensure_instance()?;
        if let Some(instance) = &self.instance {
            let restored = self.snapshot.restore(instance);
            debug!(
                target: "scripting",
                "Restored {} variable(s) into \"{}\"",
                restored,
                instance.name()
            );
        }
        self.dispatch(ON_ENABLE, &[]);
        Ok(())
    }

    pub fn start(&mut self) {
        self.dispatch(START, &[]);
    }

    /// Advances a pending literal-source reload by `delta`, then dispatches
    /// `Update`.
    pub fn update(&mut self, delta: Duration) -> Result<(), HostError> {
        if let Some(remaining) = self.pending_reload {
            if remaining.is_zero() {
                self.pending_reload = None;
                if self.is_active() {
                    self.reload()?;
                }
            } else {
                self.pending_reload = Some(remaining.saturating_sub(delta));
            }
        }

        self.dispatch(UPDATE, &[]);
        Ok(())
    }

    pub fn fixed_update(&mut self) {
        self.dispatch(FIXED_UPDATE, &[]);
    }

    pub fn disable(&mut self) {
        let Some(instance) = self.instance.take() else {
            return;
        };

        dispatch_to(&instance, self.config.is_editor(), ON_DISABLE, &[]);
        self.snapshot.capture(&instance);
        instance.dispose();
    }

    /// Tears the instance down and builds a new one from the current source.
    pub fn reload(&mut self) -> Result<(), HostError> {
        info!(target: "scripting", "Reloading script \"{}\"", self.config.name);
        self.disable();
        self.enable()
    }

    /// Replaces the literal source. A change schedules a reload that runs
    /// on a later [`Self::update`]: after the debounce delay while playing,
    /// on the very next update in the editor. Returns whether a reload was
    /// scheduled.
    pub fn set_source_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let ScriptSource::Literal { text: current } = &mut self.config.source else {
            warn!(
                target: "scripting",
                "Ignoring source text for file-backed script \"{}\"",
                self.config.name
            );
            return false;
        };

        if *current == text {
            return false;
        }
        *current = text;

        self.pending_reload = Some(if self.config.is_editor() {
            Duration::ZERO
        } else {
            self.config.reload_debounce()
        });
        true
    }

    /// The backing file changed on disk. Reloads immediately when active.
    pub fn notify_source_modified(&mut self) -> Result<(), HostError> {
        if !self.is_active() {
            return Ok(());
        }
        self.reload()
    }

    /// Broadcasts `tag` to the live instance. Functions also tagged
    /// `EditorOnly` are skipped outside the editor. Returns how many
    /// handlers completed.
    pub fn dispatch(&self, tag: &str, args: &[ScriptValue]) -> usize {
        match &self.instance {
            Some(instance) => dispatch_to(instance, self.config.is_editor(), tag, args),
            None => 0,
        }
    }

    pub fn dispatch_event(&self, event: &str) -> usize {
        self.dispatch(event, &[])
    }

    pub fn call(&self, function: &str, args: &[ScriptValue]) -> Result<ScriptValue, HostError> {
        let Some(instance) = &self.instance else {
            return Err(HostError::new(
                "COMPONENT_INACTIVE",
                format!("Script \"{}\" is not active.", self.config.name),
            ));
        };
        instance.call(function, args)
    }

    fn ensure_instance(&mut self) -> Result<(), HostError> {
        if self.instance.is_none() {
            let instance = self.build_instance()?;
            self.instance = Some(instance);
        }
        Ok(())
    }

    fn build_instance(&mut self) -> Result<ScriptInstance, HostError> {
        let source = self.config.source.load()?;
        let instance = ScriptInstance::with_options(ScriptInstanceOptions {
            name: self.config.name.clone(),
            source,
            host_functions: self.host_functions.clone(),
        })?;

        for (name, value) in &self.bindings {
            instance.set_global(name, value)?;
        }
        self.exposed = initialize_exposed_variables(&instance, &self.config.initial_values);
        Ok(instance)
    }
}

impl Drop for ScriptComponent {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            instance.dispose();
        }
    }
}

fn dispatch_to(instance: &ScriptInstance, editor: bool, tag: &str, args: &[ScriptValue]) -> usize {
    instance
        .functions_with_tag(tag)
        .into_iter()
        .filter(|function| editor || !instance.has_tag(function, EDITOR_ONLY))
        .filter(|function| instance.try_call(function, args))
        .count()
}
