use std::path::Path;
use std::time::Duration;

use lh_api::{ComponentConfig, ExecutionContext, ScriptComponent};
use lh_core::{EncodedVariable, HostError};

use crate::{
    cli_host_functions, load_host_state, load_script, save_host_state, HostState, RunArgs,
};

pub(crate) const FRAME_DELTA: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunReport {
    pub(crate) script: String,
    pub(crate) frames: usize,
    pub(crate) reloads: usize,
    pub(crate) variables: Vec<EncodedVariable>,
}

/// Drives one script through awake, enable and start, `frames` update and
/// fixed-update ticks, then disable. The variables captured on disable
/// are returned in their persistable form.
pub(crate) fn run_frames(args: &RunArgs) -> Result<RunReport, HostError> {
    let script = load_script(&args.script)?;
    let mut config = ComponentConfig::file(script.name.clone(), script.path.clone());
    if args.editor {
        config.context = ExecutionContext::Editor;
    }

    let mut component = ScriptComponent::new(config).with_host_functions(cli_host_functions());
    if let Some(state_in) = &args.state_in {
        let state = load_host_state(Path::new(state_in), &script.name)?;
        component.load_snapshot(state.variables);
    }

    component.awake()?;
    component.enable()?;
    component.start();

    let mut reloads = 0;
    for frame in 0..args.frames {
        component.update(FRAME_DELTA)?;
        component.fixed_update();
        if args.reload_at == Some(frame) {
            component.notify_source_modified()?;
            reloads += 1;
        }
    }

    component.disable();
    Ok(RunReport {
        script: script.name,
        frames: args.frames,
        reloads,
        variables: component.snapshot().encoded(),
    })
}

pub(crate) fn run_run(args: RunArgs) -> Result<i32, HostError> {
    let report = run_frames(&args)?;

    if let Some(state_out) = &args.state_out {
        save_host_state(
            Path::new(state_out),
            &HostState::new(report.script.clone(), report.variables.clone()),
        )?;
    }

    emit_run_report(&report, args.state_out.as_deref());
    Ok(0)
}

pub(crate) fn emit_run_report(report: &RunReport, state_out: Option<&str>) {
    println!("RESULT:OK");
    println!("SCRIPT:{}", report.script);
    println!("FRAMES:{}", report.frames);
    println!("RELOADS:{}", report.reloads);
    for variable in &report.variables {
        println!(
            "VARIABLE:{}|{}|{}",
            variable.name, variable.type_descriptor, variable.payload
        );
    }
    println!("STATE_OUT:{}", state_out.unwrap_or("NONE"));
}
