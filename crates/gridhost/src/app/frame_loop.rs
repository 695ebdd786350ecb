use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::manifest::GridSize;

use super::diagnostics::DiagnosticsSink;
use super::machine::{GridConfig, Machine};
use super::pause::PauseToggle;
use super::plane::PlaneKind;
use super::rendering::{present, ColorTable, GridRenderer, RenderError, VirtualScreenSize};
use super::sampling::{
    DiagnosticsSampler, ResizeSampler, SampleInterval, DEFAULT_DIAGNOSTICS_SAMPLE_INTERVAL,
    DEFAULT_RESIZE_SAMPLE_INTERVAL,
};

/// Step used for the very first frame, when no previous timestamp exists.
pub const BOOTSTRAP_DT_SECONDS: f64 = 0.016;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Next,
    Stop,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("machine tick failed: {0}")]
    Machine(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopState {
    pause: PauseToggle,
    frame_count: u64,
    last_timestamp_ms: Option<f64>,
    stop_requested: bool,
}

impl LoopState {
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn pause_label(&self) -> &'static str {
        self.pause.label()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_timestamp_ms(&self) -> Option<f64> {
        self.last_timestamp_ms
    }
}

/// Drives one machine and one renderer, one host callback at a time.
pub struct FrameLoop<M, R> {
    machine: M,
    renderer: R,
    cell_size: GridSize,
    resize_sampler: ResizeSampler,
    diagnostics: DiagnosticsSampler,
    state: LoopState,
}

impl<M: Machine, R: GridRenderer> FrameLoop<M, R> {
    pub fn new(
        machine: M,
        renderer: R,
        cell_size: GridSize,
        diagnostics_sink: Box<dyn DiagnosticsSink>,
    ) -> Self {
        Self {
            machine,
            renderer,
            cell_size,
            resize_sampler: ResizeSampler::new(SampleInterval::every(
                DEFAULT_RESIZE_SAMPLE_INTERVAL,
            )),
            diagnostics: DiagnosticsSampler::new(
                SampleInterval::every(DEFAULT_DIAGNOSTICS_SAMPLE_INTERVAL),
                diagnostics_sink,
            ),
            state: LoopState::default(),
        }
    }

    pub fn with_sample_intervals(mut self, resize: SampleInterval, diagnostics: SampleInterval) -> Self {
        self.resize_sampler = ResizeSampler::new(resize);
        self.diagnostics = DiagnosticsSampler::new(diagnostics, self.diagnostics.into_sink());
        self
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    /// For event handlers writing input addresses between steps.
    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Flips pause and returns the control label for the new state.
    pub fn toggle_pause(&mut self) -> &'static str {
        let paused = self.state.pause.toggle();
        let label = self.state.pause.label();
        info!(paused, label, "pause_toggled");
        label
    }

    /// The next step returns [`Schedule::Stop`] without doing any work.
    pub fn request_stop(&mut self) {
        self.state.stop_requested = true;
    }

    /// Runs one frame for the host callback fired at `t_next_ms`.
    pub fn step(&mut self, t_next_ms: f64) -> Result<Schedule, FrameError> {
        if self.state.stop_requested {
            return Ok(Schedule::Stop);
        }
        // Paused frames leave the timestamp alone so no time accrues.
        if self.state.pause.is_paused() {
            return Ok(Schedule::Next);
        }

        let started = Instant::now();
        let frame_count = self.state.frame_count;

        let dt = next_dt_seconds(self.state.last_timestamp_ms, t_next_ms);
        self.state.last_timestamp_ms = Some(t_next_ms);
        self.machine
            .tick(dt)
            .map_err(|error| FrameError::Machine(Box::new(error)))?;

        let resized = self.resize_sampler.sample(frame_count, &mut self.renderer)?;

        let config = self.machine.config();
        let uploaded_any = self.upload_dirty_planes(config)?;

        if uploaded_any || resized {
            let size = VirtualScreenSize::for_grid(config, self.cell_size);
            let ack = present(&mut self.renderer, size, config.rows, config.cols)?;
            self.machine.planes_mut().acknowledge_all(&ack);
        }

        self.diagnostics
            .maybe_publish(frame_count, started.elapsed());

        self.state.frame_count = frame_count.wrapping_add(1);
        Ok(Schedule::Next)
    }

    fn upload_dirty_planes(&mut self, config: GridConfig) -> Result<bool, RenderError> {
        let planes = self.machine.planes();
        let mut uploaded_any = false;
        for kind in PlaneKind::ALL {
            let plane = planes.get(kind);
            if !plane.is_dirty() {
                continue;
            }
            match kind {
                PlaneKind::Foreground => self.renderer.update_with_color_data(
                    ColorTable::Foreground,
                    config.cols,
                    config.rows,
                    plane.cells(),
                )?,
                PlaneKind::Background => self.renderer.update_with_color_data(
                    ColorTable::Background,
                    config.cols,
                    config.rows,
                    plane.cells(),
                )?,
                PlaneKind::Chars => {
                    self.renderer
                        .update_with_char_data(config.cols, config.rows, plane.cells())?
                }
            }
            uploaded_any = true;
        }
        Ok(uploaded_any)
    }
}

fn next_dt_seconds(last_timestamp_ms: Option<f64>, t_next_ms: f64) -> f64 {
    match last_timestamp_ms {
        None => BOOTSTRAP_DT_SECONDS,
        Some(last) => (t_next_ms - last) / 1000.0,
    }
}
