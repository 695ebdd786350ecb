use gridhost::{GridConfig, InputValue, Machine, PlaneSet};

use super::ProgramError;

pub(crate) const CONSOLE_ROWS: u32 = 25;
pub(crate) const CONSOLE_COLS: u32 = 80;
pub(crate) const INPUT_ADDRESSES: u32 = 16;

// Palette indices. Short palettes wrap at render time.
pub(crate) const COLOR_BACKGROUND: u8 = 0;
pub(crate) const COLOR_TEXT: u8 = 1;
pub(crate) const COLOR_LIT: u8 = 2;
pub(crate) const COLOR_DIM: u8 = 3;

pub(crate) const TITLE_ROW: u32 = 0;
pub(crate) const CLOCK_ROW: u32 = 2;
pub(crate) const INPUT_ROW: u32 = 4;
pub(crate) const VALUE_COLUMN: u32 = 8;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Status console: title bar, uptime clock and a lamp per input address.
#[derive(Debug)]
pub(crate) struct ConsoleMachine {
    planes: PlaneSet,
    uptime_seconds: f64,
    shown_seconds: u64,
    inputs: [InputValue; INPUT_ADDRESSES as usize],
}

impl ConsoleMachine {
    pub(crate) fn new(title: &str) -> Self {
        let config = GridConfig {
            rows: CONSOLE_ROWS,
            cols: CONSOLE_COLS,
        };
        let mut machine = Self {
            planes: PlaneSet::new(config.cell_count()),
            uptime_seconds: 0.0,
            shown_seconds: 0,
            inputs: [InputValue::Released; INPUT_ADDRESSES as usize],
        };
        machine.draw_static_layout(title);
        machine.draw_clock(0);
        machine
    }

    fn draw_static_layout(&mut self, title: &str) {
        let title_bar = format!(" GRIDTERM  {title}");
        for col in 0..CONSOLE_COLS {
            self.put(TITLE_ROW, col, b' ', COLOR_BACKGROUND, COLOR_TEXT);
        }
        self.write_text(TITLE_ROW, 0, &title_bar, COLOR_BACKGROUND, COLOR_TEXT);
        self.write_text(CLOCK_ROW, 0, "UPTIME", COLOR_TEXT, COLOR_BACKGROUND);
        self.write_text(INPUT_ROW, 0, "INPUT", COLOR_TEXT, COLOR_BACKGROUND);
        for address in 0..INPUT_ADDRESSES {
            self.put(
                INPUT_ROW,
                input_column(address),
                HEX_DIGITS[address as usize],
                COLOR_DIM,
                COLOR_BACKGROUND,
            );
        }
    }

    fn draw_clock(&mut self, whole_seconds: u64) {
        self.shown_seconds = whole_seconds;
        let text = format_uptime(whole_seconds);
        self.write_text(CLOCK_ROW, VALUE_COLUMN, &text, COLOR_TEXT, COLOR_BACKGROUND);
    }

    fn write_text(&mut self, row: u32, col: u32, text: &str, fg: u8, bg: u8) {
        for (offset, byte) in text.bytes().enumerate() {
            let glyph = if byte.is_ascii() { byte } else { b'?' };
            self.put(row, col + offset as u32, glyph, fg, bg);
        }
    }

    // Plane::set only dirties a plane when the cell value changes.
    fn put(&mut self, row: u32, col: u32, glyph: u8, fg: u8, bg: u8) {
        if row >= CONSOLE_ROWS || col >= CONSOLE_COLS {
            return;
        }
        let index = cell_index(row, col);
        self.planes.screen.set(index, glyph);
        self.planes.fg_colors.set(index, fg);
        self.planes.bg_colors.set(index, bg);
    }
}

impl Machine for ConsoleMachine {
    type Error = ProgramError;

    fn tick(&mut self, dt_seconds: f64) -> Result<(), Self::Error> {
        if !dt_seconds.is_finite() || dt_seconds < 0.0 {
            return Err(ProgramError::InvalidTick { dt_seconds });
        }
        self.uptime_seconds += dt_seconds;
        let whole_seconds = self.uptime_seconds as u64;
        if whole_seconds != self.shown_seconds {
            self.draw_clock(whole_seconds);
        }
        Ok(())
    }

    fn set_input(&mut self, address: u32, value: InputValue) {
        let Some(slot) = self.inputs.get_mut(address as usize) else {
            return;
        };
        if *slot == value {
            return;
        }
        *slot = value;
        let color = match value {
            InputValue::Pressed => COLOR_LIT,
            InputValue::Released => COLOR_DIM,
        };
        let index = cell_index(INPUT_ROW, input_column(address));
        self.planes.fg_colors.set(index, color);
    }

    fn config(&self) -> GridConfig {
        GridConfig {
            rows: CONSOLE_ROWS,
            cols: CONSOLE_COLS,
        }
    }

    fn planes(&self) -> &PlaneSet {
        &self.planes
    }

    fn planes_mut(&mut self) -> &mut PlaneSet {
        &mut self.planes
    }
}

pub(crate) fn cell_index(row: u32, col: u32) -> usize {
    row as usize * CONSOLE_COLS as usize + col as usize
}

pub(crate) fn input_column(address: u32) -> u32 {
    VALUE_COLUMN + address * 2
}

pub(crate) fn format_uptime(whole_seconds: u64) -> String {
    let hours = whole_seconds / 3600;
    let minutes = (whole_seconds / 60) % 60;
    let seconds = whole_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
impl ConsoleMachine {
    pub(crate) fn uptime_seconds(&self) -> f64 {
        self.uptime_seconds
    }

    pub(crate) fn input(&self, address: u32) -> Option<InputValue> {
        self.inputs.get(address as usize).copied()
    }
}

/// Text of `len` cells starting at `(row, col)`, for assertions.
#[cfg(test)]
pub(crate) fn read_text(plane: &gridhost::Plane, row: u32, col: u32, len: usize) -> String {
    let start = cell_index(row, col);
    plane.cells()[start..start + len]
        .iter()
        .map(|byte| char::from(*byte))
        .collect()
}
