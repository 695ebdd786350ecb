use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

pub mod app;
pub mod manifest;

pub use app::{
    key_identifier, run_app, AppError, ColorTable, DiagnosticsHandle, DiagnosticsSink,
    DiagnosticsSnapshot, FrameDiagnostics, FrameError, FrameLoop, GridConfig, GridRenderer,
    InputMapper, InputValue, LoopConfig, LoopState, Machine, PauseToggle, Plane, PlaneKind,
    PlaneSet, PlaneState, RenderError, Renderer, SampleInterval, Schedule, VirtualScreenSize,
    BOOTSTRAP_DT_SECONDS,
};
pub use manifest::{
    load_manifest, parse_manifest, FontsManifest, GridSize, InputMapping, Manifest,
    ManifestError, Palette, SUPPORTED_MANIFEST_VERSION,
};

pub const MANIFEST_ENV_VAR: &str = "GRIDTERM_MANIFEST";
pub const DEFAULT_MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("{var} is set but empty; unset it or point it at a manifest file")]
    EmptyEnvPath { var: &'static str },
}

/// Picks the manifest path: the CLI argument, then `GRIDTERM_MANIFEST`, then
/// `manifest.json` in the current directory.
pub fn resolve_manifest_path(cli_arg: Option<OsString>) -> Result<PathBuf, StartupError> {
    let from_env = match env::var(MANIFEST_ENV_VAR) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: MANIFEST_ENV_VAR,
                source,
            })
        }
    };
    select_manifest_path(cli_arg, from_env)
}

fn select_manifest_path(
    cli_arg: Option<OsString>,
    from_env: Option<String>,
) -> Result<PathBuf, StartupError> {
    if let Some(arg) = cli_arg {
        return Ok(PathBuf::from(arg));
    }
    match from_env {
        Some(value) if value.trim().is_empty() => Err(StartupError::EmptyEnvPath {
            var: MANIFEST_ENV_VAR,
        }),
        Some(value) => Ok(PathBuf::from(value)),
        None => Ok(PathBuf::from(DEFAULT_MANIFEST_FILE)),
    }
}
