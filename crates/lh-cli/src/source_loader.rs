use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lh_core::HostError;
use walkdir::WalkDir;

use crate::{map_cli_source_read, map_cli_source_scan, map_cli_working_dir, LoadedScript};

const LUA_EXTENSION: &str = "lua";

pub(crate) fn load_script(script: &str) -> Result<LoadedScript, HostError> {
    let path = resolve_path(script)?;
    if !path.is_file() {
        return Err(HostError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("script is not a file: {}", path.display()),
        ));
    }

    let source = fs::read_to_string(&path).map_err(map_cli_source_read(&path))?;
    Ok(LoadedScript {
        name: script_name(&path),
        path,
        source,
    })
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, HostError> {
    let absolute = resolve_path(scripts_dir)?;
    if !absolute.is_dir() {
        return Err(HostError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

fn resolve_path(raw: &str) -> Result<PathBuf, HostError> {
    let path = PathBuf::from(raw);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_working_dir)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(HostError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("path does not exist: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Every `.lua` file under `scripts_dir`, keyed by `/`-separated relative path.
pub(crate) fn read_lua_scripts_from_dir(
    scripts_dir: &Path,
) -> Result<BTreeMap<String, String>, HostError> {
    let mut scripts = BTreeMap::new();

    for entry in WalkDir::new(scripts_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|extension| extension.to_str()) != Some(LUA_EXTENSION) {
            continue;
        }

        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(map_cli_source_scan(scripts_dir))?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(map_cli_source_read(path))?;
        scripts.insert(relative, content);
    }

    if scripts.is_empty() {
        return Err(HostError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .lua files under {}", scripts_dir.display()),
        ));
    }

    Ok(scripts)
}

pub(crate) fn script_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("script")
        .to_string()
}
