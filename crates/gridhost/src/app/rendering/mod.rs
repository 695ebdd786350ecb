mod compose;
mod font_atlas;
mod renderer;
mod tables;
mod transform;

use std::path::PathBuf;

use thiserror::Error;

pub use font_atlas::FontAtlas;
pub use renderer::Renderer;
pub use tables::{CellTable, ColorTable, RendererState};
pub use transform::{cell_origin_px, VirtualScreenSize};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("gpu surface error: {0}")]
    Surface(#[source] pixels::Error),
    #[error("gpu texture error: {0}")]
    Texture(#[source] pixels::TextureError),
    #[error("failed to open font atlas {path}: {source}")]
    AtlasOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode font atlas {path}: {source}")]
    AtlasDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(
        "font atlas of {atlas_width}x{atlas_height} cannot hold {glyph_width}x{glyph_height} glyphs"
    )]
    AtlasGeometry {
        atlas_width: u32,
        atlas_height: u32,
        glyph_width: u32,
        glyph_height: u32,
    },
    #[error("{table} table upload needs {expected} cells, got {actual}")]
    TableSize {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Proof that a composite pass was rendered and the GPU finished consuming
/// it. Only [`present`] produces one, and planes can only be cleaned with it.
#[derive(Debug)]
pub struct GpuAck {
    _private: (),
}

impl GpuAck {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// GPU-facing side of the frame loop.
///
/// Uploads replace a table's contents but draw nothing. `render` composites
/// the three tables into the display, `finish` blocks until the GPU is idle.
pub trait GridRenderer {
    fn update_with_color_data(
        &mut self,
        table: ColorTable,
        cols: u32,
        rows: u32,
        cells: &[u8],
    ) -> Result<(), RenderError>;

    fn update_with_char_data(&mut self, cols: u32, rows: u32, cells: &[u8])
        -> Result<(), RenderError>;

    fn render(&mut self, size: VirtualScreenSize, rows: u32, cols: u32)
        -> Result<(), RenderError>;

    fn finish(&mut self) -> Result<(), RenderError>;

    /// Resizes the backing store when the display surface changed size.
    /// Returns whether a resize happened.
    fn resize_to_display_size(&mut self) -> Result<bool, RenderError>;
}

pub(crate) fn present<R: GridRenderer + ?Sized>(
    renderer: &mut R,
    size: VirtualScreenSize,
    rows: u32,
    cols: u32,
) -> Result<GpuAck, RenderError> {
    renderer.render(size, rows, cols)?;
    renderer.finish()?;
    Ok(GpuAck::new())
}
