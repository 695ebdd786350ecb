use std::error::Error as StdError;

use super::plane::PlaneSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub rows: u32,
    pub cols: u32,
}

impl GridConfig {
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputValue {
    Released,
    Pressed,
}

impl InputValue {
    pub const fn as_u8(self) -> u8 {
        match self {
            InputValue::Released => 0,
            InputValue::Pressed => 1,
        }
    }
}

/// The running program as seen by the frame loop.
///
/// Implementations own the input address space and the three grid planes.
/// `tick` is the only place simulated time advances; planes written during a
/// tick must be marked dirty so the loop re-uploads them.
pub trait Machine {
    type Error: StdError + Send + Sync + 'static;

    fn tick(&mut self, dt_seconds: f64) -> Result<(), Self::Error>;

    fn set_input(&mut self, address: u32, value: InputValue);

    /// Current grid geometry. May change between ticks.
    fn config(&self) -> GridConfig;

    fn planes(&self) -> &PlaneSet;

    fn planes_mut(&mut self) -> &mut PlaneSet;
}
