use gridhost::{GridConfig, InputValue, Machine, Manifest, PlaneSet};
use thiserror::Error;
use tracing::info;

mod console;

pub(crate) use console::ConsoleMachine;

pub(crate) const CONSOLE_PROGRAM: &str = "builtin:console";

#[derive(Debug, Error)]
pub(crate) enum ProgramError {
    #[error("unknown program `{program}`; built-in programs: {known}")]
    UnknownProgram { program: String, known: String },
    #[error("program received a non-finite or negative tick of {dt_seconds}s")]
    InvalidTick { dt_seconds: f64 },
}

/// Every machine the binary can run, selected by the manifest's `program`.
#[derive(Debug)]
pub(crate) enum BuiltinProgram {
    Console(ConsoleMachine),
}

pub(crate) fn build_program(manifest: &Manifest) -> Result<BuiltinProgram, ProgramError> {
    let program = match manifest.program.as_str() {
        CONSOLE_PROGRAM => BuiltinProgram::Console(ConsoleMachine::new(&manifest.program)),
        other => {
            return Err(ProgramError::UnknownProgram {
                program: other.to_string(),
                known: [CONSOLE_PROGRAM].join(", "),
            })
        }
    };
    let config = program.config();
    info!(
        program = %manifest.program,
        rows = config.rows,
        cols = config.cols,
        "program_loaded"
    );
    Ok(program)
}

impl Machine for BuiltinProgram {
    type Error = ProgramError;

    fn tick(&mut self, dt_seconds: f64) -> Result<(), Self::Error> {
        match self {
            BuiltinProgram::Console(machine) => machine.tick(dt_seconds),
        }
    }

    fn set_input(&mut self, address: u32, value: InputValue) {
        match self {
            BuiltinProgram::Console(machine) => machine.set_input(address, value),
        }
    }

    fn config(&self) -> GridConfig {
        match self {
            BuiltinProgram::Console(machine) => machine.config(),
        }
    }

    fn planes(&self) -> &PlaneSet {
        match self {
            BuiltinProgram::Console(machine) => machine.planes(),
        }
    }

    fn planes_mut(&mut self) -> &mut PlaneSet {
        match self {
            BuiltinProgram::Console(machine) => machine.planes_mut(),
        }
    }
}
