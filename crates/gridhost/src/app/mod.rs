mod diagnostics;
mod frame_loop;
mod input;
mod loop_runner;
mod machine;
mod pause;
mod plane;
mod rendering;
mod sampling;

pub use diagnostics::{DiagnosticsHandle, DiagnosticsSink, DiagnosticsSnapshot, FrameDiagnostics};
pub use frame_loop::{FrameError, FrameLoop, LoopState, Schedule, BOOTSTRAP_DT_SECONDS};
pub use input::InputMapper;
pub use loop_runner::{
    key_identifier, run_app, AppError, LoopConfig, DEFAULT_DOUBLE_CLICK_WINDOW, DEFAULT_PAUSE_KEY,
};
pub use machine::{GridConfig, InputValue, Machine};
pub use pause::{PauseToggle, PAUSE_LABEL, PLAY_LABEL};
pub use plane::{Plane, PlaneKind, PlaneSet, PlaneState};
pub use rendering::{
    cell_origin_px, CellTable, ColorTable, FontAtlas, GpuAck, GridRenderer, RenderError,
    Renderer, RendererState, VirtualScreenSize,
};
pub use sampling::{
    DiagnosticsSampler, ResizeSampler, SampleInterval, DEFAULT_DIAGNOSTICS_SAMPLE_INTERVAL,
    DEFAULT_RESIZE_SAMPLE_INTERVAL,
};
