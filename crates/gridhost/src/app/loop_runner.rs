use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::manifest::Manifest;

use super::diagnostics::DiagnosticsHandle;
use super::frame_loop::{FrameError, FrameLoop, Schedule};
use super::input::InputMapper;
use super::machine::Machine;
use super::pause::PAUSE_LABEL;
use super::rendering::{FontAtlas, GridRenderer, RenderError, Renderer, VirtualScreenSize};
use super::sampling::{
    SampleInterval, DEFAULT_DIAGNOSTICS_SAMPLE_INTERVAL, DEFAULT_RESIZE_SAMPLE_INTERVAL,
};

pub const DEFAULT_PAUSE_KEY: &str = "F1";
pub const DEFAULT_DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_FRAME_RATE: u32 = 60;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub resize_sample_interval: u64,
    pub diagnostics_sample_interval: u64,
    pub pause_key: String,
    pub double_click_window: Duration,
    pub max_frame_rate: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "gridterm".to_string(),
            window_width: 1280,
            window_height: 600,
            resize_sample_interval: DEFAULT_RESIZE_SAMPLE_INTERVAL,
            diagnostics_sample_interval: DEFAULT_DIAGNOSTICS_SAMPLE_INTERVAL,
            pause_key: DEFAULT_PAUSE_KEY.to_string(),
            double_click_window: DEFAULT_DOUBLE_CLICK_WINDOW,
            max_frame_rate: DEFAULT_MAX_FRAME_RATE,
        }
    }
}

impl LoopConfig {
    /// Replaces zero intervals, zero window sizes, a zero frame rate and an
    /// empty pause key with their defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            window_title: self.window_title,
            window_width: non_zero_or(self.window_width, defaults.window_width),
            window_height: non_zero_or(self.window_height, defaults.window_height),
            resize_sample_interval: non_zero_or(
                self.resize_sample_interval,
                defaults.resize_sample_interval,
            ),
            diagnostics_sample_interval: non_zero_or(
                self.diagnostics_sample_interval,
                defaults.diagnostics_sample_interval,
            ),
            pause_key: if self.pause_key.is_empty() {
                defaults.pause_key
            } else {
                self.pause_key
            },
            double_click_window: if self.double_click_window.is_zero() {
                defaults.double_click_window
            } else {
                self.double_click_window
            },
            max_frame_rate: non_zero_or(self.max_frame_rate, defaults.max_frame_rate),
        }
    }
}

fn non_zero_or<T: PartialEq + Default>(value: T, fallback: T) -> T {
    if value == T::default() {
        fallback
    } else {
        value
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] RenderError),
    #[error("frame loop stopped: {0}")]
    Frame(#[from] FrameError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `machine` until the window closes or a frame
/// fails.
pub fn run_app<M: Machine + 'static>(
    config: LoopConfig,
    manifest: &Manifest,
    machine: M,
    diagnostics: DiagnosticsHandle,
) -> Result<(), AppError> {
    let config = config.normalized();
    let cell_size = manifest.cell_size();
    let grid = machine.config();

    let mut title_bar = TitleBar::new(&config.window_title, diagnostics.clone());

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(title_bar.text())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );

    let atlas = FontAtlas::load(&manifest.font_atlas_path(), cell_size)
        .map_err(AppError::CreateRenderer)?;
    let renderer = Renderer::new(
        Arc::clone(&window),
        atlas,
        manifest.palette.clone(),
        VirtualScreenSize::for_grid(grid, cell_size),
    )
    .map_err(AppError::CreateRenderer)?;

    let mut frame_loop = FrameLoop::new(machine, renderer, cell_size, Box::new(diagnostics))
        .with_sample_intervals(
            SampleInterval::every(config.resize_sample_interval),
            SampleInterval::every(config.diagnostics_sample_interval),
        );
    let input = InputMapper::new(manifest.input_mappings.clone());
    let mut double_click = DoubleClickDetector::new(config.double_click_window);
    let mut pacer = FramePacer::new(config.max_frame_rate);

    info!(
        rows = grid.rows,
        cols = grid.cols,
        cell_width = cell_size.width,
        cell_height = cell_size.height,
        input_mappings = input.mappings().len(),
        resize_sample_interval = config.resize_sample_interval,
        diagnostics_sample_interval = config.diagnostics_sample_interval,
        pause_key = %config.pause_key,
        double_click_window_ms = config.double_click_window.as_millis() as u64,
        max_frame_rate = config.max_frame_rate,
        "loop_config"
    );

    event_loop.set_control_flow(ControlFlow::Wait);
    window.request_redraw();

    let started = Instant::now();
    let failure: Rc<RefCell<Option<FrameError>>> = Rc::new(RefCell::new(None));
    let failure_in_loop = Rc::clone(&failure);
    let window_for_loop = Arc::clone(&window);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        frame_loop.request_stop();
                        drive_frame(
                            &mut frame_loop,
                            started,
                            &window_for_loop,
                            window_target,
                            &mut pacer,
                            &mut title_bar,
                            &failure_in_loop,
                        );
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        match classify_key(&event, &config.pause_key) {
                            KeyAction::TogglePause => {
                                let label = frame_loop.toggle_pause();
                                window_for_loop.set_title(&title_bar.set_label(label));
                            }
                            KeyAction::Press(key) => {
                                let writes = input.press(frame_loop.machine_mut(), &key);
                                debug!(key = %key, writes, "key_pressed");
                            }
                            KeyAction::Release(key) => {
                                let writes = input.release(frame_loop.machine_mut(), &key);
                                debug!(key = %key, writes, "key_released");
                            }
                            KeyAction::Ignore => {}
                        }
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        if double_click.register_click(Instant::now()) {
                            toggle_fullscreen(&window_for_loop);
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        drive_frame(
                            &mut frame_loop,
                            started,
                            &window_for_loop,
                            window_target,
                            &mut pacer,
                            &mut title_bar,
                            &failure_in_loop,
                        );
                    }
                    // Surface size changes are picked up by the resize sampler.
                    _ => {}
                }
            }
            Event::AboutToWait => match pacer.poll(Instant::now()) {
                PacerAction::RedrawNow => {
                    window_target.set_control_flow(ControlFlow::Wait);
                    window_for_loop.request_redraw();
                }
                PacerAction::WaitUntil(deadline) => {
                    window_target.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
                PacerAction::Idle => {}
            },
            Event::LoopExiting => {
                info!(frames = frame_loop.state().frame_count(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)?;

    let failed = failure.borrow_mut().take();
    match failed {
        Some(error) => Err(AppError::Frame(error)),
        None => Ok(()),
    }
}

fn drive_frame<M: Machine, R: GridRenderer>(
    frame_loop: &mut FrameLoop<M, R>,
    started: Instant,
    window: &Window,
    window_target: &EventLoopWindowTarget<()>,
    pacer: &mut FramePacer,
    title_bar: &mut TitleBar,
    failure: &RefCell<Option<FrameError>>,
) {
    let frame_started = Instant::now();
    let t_ms = frame_started.duration_since(started).as_secs_f64() * 1000.0;
    match run_step(frame_loop, t_ms, title_bar, failure) {
        StepOutcome::Continue { title } => {
            if let Some(title) = title {
                window.set_title(&title);
            }
            let deadline = pacer.schedule(frame_started, Instant::now());
            window_target.set_control_flow(ControlFlow::WaitUntil(deadline));
        }
        StepOutcome::Exit => window_target.exit(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StepOutcome {
    Continue { title: Option<String> },
    Exit,
}

/// Steps the loop once. After the first recorded failure nothing is stepped
/// again, so the stored error is always the one that stopped the loop.
fn run_step<M: Machine, R: GridRenderer>(
    frame_loop: &mut FrameLoop<M, R>,
    t_ms: f64,
    title_bar: &mut TitleBar,
    failure: &RefCell<Option<FrameError>>,
) -> StepOutcome {
    if failure.borrow().is_some() {
        return StepOutcome::Exit;
    }
    match frame_loop.step(t_ms) {
        Ok(Schedule::Next) => StepOutcome::Continue {
            title: title_bar.refresh(),
        },
        Ok(Schedule::Stop) => StepOutcome::Exit,
        Err(frame_error) => {
            error!(
                error = %frame_error,
                frame = frame_loop.state().frame_count(),
                "frame_failed"
            );
            *failure.borrow_mut() = Some(frame_error);
            StepOutcome::Exit
        }
    }
}

fn target_frame_duration(max_frame_rate: u32) -> Duration {
    Duration::from_secs_f64(1.0 / max_frame_rate.max(1) as f64)
}

/// A frame that overran its budget is redrawn right away, without trying to
/// catch up the frames it missed.
fn next_frame_deadline(frame_started: Instant, now: Instant, target: Duration) -> Instant {
    (frame_started + target).max(now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PacerAction {
    Idle,
    RedrawNow,
    WaitUntil(Instant),
}

/// Holds the next redraw back until the frame-rate cap allows it.
#[derive(Debug)]
struct FramePacer {
    target: Duration,
    pending: Option<Instant>,
}

impl FramePacer {
    fn new(max_frame_rate: u32) -> Self {
        Self {
            target: target_frame_duration(max_frame_rate),
            pending: None,
        }
    }

    fn schedule(&mut self, frame_started: Instant, now: Instant) -> Instant {
        let deadline = next_frame_deadline(frame_started, now, self.target);
        self.pending = Some(deadline);
        deadline
    }

    fn poll(&mut self, now: Instant) -> PacerAction {
        match self.pending {
            None => PacerAction::Idle,
            Some(deadline) if now >= deadline => {
                self.pending = None;
                PacerAction::RedrawNow
            }
            Some(deadline) => PacerAction::WaitUntil(deadline),
        }
    }
}

/// Window title: base title, control label and the latest sampled frame time.
#[derive(Debug)]
struct TitleBar {
    base: String,
    label: &'static str,
    frame_time: Option<String>,
    diagnostics: DiagnosticsHandle,
    shown_revision: u64,
}

impl TitleBar {
    fn new(base: &str, diagnostics: DiagnosticsHandle) -> Self {
        Self {
            base: base.to_string(),
            label: PAUSE_LABEL,
            frame_time: None,
            diagnostics,
            shown_revision: 0,
        }
    }

    fn text(&self) -> String {
        let titled = window_title_with_label(&self.base, self.label);
        match &self.frame_time {
            Some(time) => format!("{titled} {time}"),
            None => titled,
        }
    }

    fn set_label(&mut self, label: &'static str) -> String {
        self.label = label;
        self.text()
    }

    /// New title text when a record was published since the last call.
    fn refresh(&mut self) -> Option<String> {
        let snapshot = self.diagnostics.snapshot();
        if snapshot.revision == self.shown_revision {
            return None;
        }
        self.shown_revision = snapshot.revision;
        self.frame_time = snapshot.record.map(|record| record.time);
        Some(self.text())
    }
}

fn toggle_fullscreen(window: &Window) {
    let entering = window.fullscreen().is_none();
    if entering {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
    info!(fullscreen = entering, "fullscreen_requested");
}

fn window_title_with_label(title: &str, label: &str) -> String {
    format!("{title} [{label}]")
}

/// Translates a logical key into the DOM `KeyboardEvent.key` vocabulary
/// used by manifest input mappings.
pub fn key_identifier(key: &Key) -> Option<String> {
    match key {
        Key::Character(text) => Some(text.to_string()),
        Key::Named(NamedKey::Space) => Some(" ".to_string()),
        Key::Named(named) => Some(format!("{named:?}")),
        Key::Unidentified(_) | Key::Dead(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyAction {
    TogglePause,
    Press(String),
    Release(String),
    Ignore,
}

fn classify_key(event: &KeyEvent, pause_key: &str) -> KeyAction {
    classify_key_parts(&event.logical_key, event.state, event.repeat, pause_key)
}

fn classify_key_parts(key: &Key, state: ElementState, repeat: bool, pause_key: &str) -> KeyAction {
    let Some(identifier) = key_identifier(key) else {
        return KeyAction::Ignore;
    };
    if identifier == pause_key {
        return if state == ElementState::Pressed && !repeat {
            KeyAction::TogglePause
        } else {
            KeyAction::Ignore
        };
    }
    match state {
        ElementState::Pressed => KeyAction::Press(identifier),
        ElementState::Released => KeyAction::Release(identifier),
    }
}

#[derive(Debug, Clone, Copy)]
struct DoubleClickDetector {
    window: Duration,
    last_click: Option<Instant>,
}

impl DoubleClickDetector {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_click: None,
        }
    }

    /// Returns true when `at` completes a double click. A completed double
    /// click does not count as the first click of the next one.
    fn register_click(&mut self, at: Instant) -> bool {
        match self.last_click {
            Some(previous) if at.saturating_duration_since(previous) <= self.window => {
                self.last_click = None;
                true
            }
            _ => {
                self.last_click = Some(at);
                false
            }
        }
    }
}
