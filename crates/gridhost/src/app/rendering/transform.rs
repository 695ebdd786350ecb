use crate::app::GridConfig;
use crate::manifest::GridSize;

/// Pixel size of the whole character grid before any scaling to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualScreenSize {
    pub width: u32,
    pub height: u32,
}

impl VirtualScreenSize {
    pub fn for_grid(config: GridConfig, cell: GridSize) -> Self {
        Self {
            width: config.cols.saturating_mul(cell.width),
            height: config.rows.saturating_mul(cell.height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Top-left pixel of the cell at (`col`, `row`).
pub fn cell_origin_px(col: u32, row: u32, cell: GridSize) -> (u32, u32) {
    (col * cell.width, row * cell.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_size_is_cols_by_cell_width_and_rows_by_cell_height() {
        let size = VirtualScreenSize::for_grid(
            GridConfig { rows: 25, cols: 80 },
            GridSize {
                width: 8,
                height: 12,
            },
        );
        assert_eq!(
            size,
            VirtualScreenSize {
                width: 640,
                height: 300
            }
        );
        assert_eq!(size.pixel_count(), 192_000);
    }

    #[test]
    fn empty_grid_gives_empty_virtual_size() {
        let size = VirtualScreenSize::for_grid(
            GridConfig { rows: 0, cols: 80 },
            GridSize {
                width: 8,
                height: 8,
            },
        );
        assert!(size.is_empty());
    }

    #[test]
    fn cell_origin_steps_by_cell_size() {
        let cell = GridSize {
            width: 8,
            height: 12,
        };
        assert_eq!(cell_origin_px(0, 0, cell), (0, 0));
        assert_eq!(cell_origin_px(3, 2, cell), (24, 24));
    }
}
