use std::env;

use gridhost::{
    load_manifest, resolve_manifest_path, DiagnosticsHandle, LoopConfig, Manifest, ManifestError,
    StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::programs::{build_program, BuiltinProgram, ProgramError};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) manifest: Manifest,
    pub(crate) program: BuiltinProgram,
    pub(crate) diagnostics: DiagnosticsHandle,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Program(#[from] ProgramError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "startup");

    let manifest_path = resolve_manifest_path(env::args_os().nth(1))?;
    let manifest = load_manifest(&manifest_path)?;
    let program = build_program(&manifest)?;

    Ok(AppWiring {
        config: LoopConfig::default(),
        manifest,
        program,
        diagnostics: DiagnosticsHandle::default(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
