use super::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTable {
    Foreground,
    Background,
}

impl ColorTable {
    pub fn name(self) -> &'static str {
        match self {
            ColorTable::Foreground => "foreground",
            ColorTable::Background => "background",
        }
    }
}

/// `cols × rows` bytes staged for the next composite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellTable {
    cols: u32,
    rows: u32,
    cells: Vec<u8>,
}

impl CellTable {
    #[cfg(test)]
    pub(crate) fn cols(&self) -> u32 {
        self.cols
    }

    #[cfg(test)]
    pub(crate) fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Copies the first `cols × rows` cells. A shorter slice is rejected and
    /// leaves the table untouched.
    pub fn update(
        &mut self,
        name: &'static str,
        cols: u32,
        rows: u32,
        cells: &[u8],
    ) -> Result<(), RenderError> {
        let expected = cols as usize * rows as usize;
        if cells.len() < expected {
            return Err(RenderError::TableSize {
                table: name,
                expected,
                actual: cells.len(),
            });
        }

        self.cols = cols;
        self.rows = rows;
        self.cells.clear();
        self.cells.extend_from_slice(&cells[..expected]);
        Ok(())
    }

    /// Cells outside the uploaded geometry read as zero.
    pub fn get(&self, col: u32, row: u32) -> u8 {
        if col >= self.cols || row >= self.rows {
            return 0;
        }
        self.cells[row as usize * self.cols as usize + col as usize]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererState {
    pub chars_table: CellTable,
    pub fg_color_table: CellTable,
    pub bg_color_table: CellTable,
}

impl RendererState {
    pub fn color_table_mut(&mut self, table: ColorTable) -> &mut CellTable {
        match table {
            ColorTable::Foreground => &mut self.fg_color_table,
            ColorTable::Background => &mut self.bg_color_table,
        }
    }
}
