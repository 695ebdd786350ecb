use std::sync::Arc;

use pixels::wgpu;
use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, info};
use winit::window::Window;

use crate::manifest::Palette;

use super::compose::compose_grid;
use super::font_atlas::FontAtlas;
use super::tables::{ColorTable, RendererState};
use super::transform::VirtualScreenSize;
use super::{GridRenderer, RenderError};

/// `pixels`-backed grid renderer.
///
/// The pixel buffer is kept at the virtual screen size; `pixels` scales it to
/// the window surface, which is only resized through
/// [`GridRenderer::resize_to_display_size`].
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    surface_size: (u32, u32),
    buffer_size: VirtualScreenSize,
    state: RendererState,
    atlas: FontAtlas,
    palette: Palette,
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        atlas: FontAtlas,
        palette: Palette,
        initial_size: VirtualScreenSize,
    ) -> Result<Self, RenderError> {
        let surface = window.inner_size();
        let surface_size = (surface.width.max(1), surface.height.max(1));
        let buffer_size = VirtualScreenSize {
            width: initial_size.width.max(1),
            height: initial_size.height.max(1),
        };
        let surface_texture =
            SurfaceTexture::new(surface_size.0, surface_size.1, Arc::clone(&window));
        let pixels = Pixels::new(buffer_size.width, buffer_size.height, surface_texture)
            .map_err(RenderError::Surface)?;

        Ok(Self {
            window,
            pixels,
            surface_size,
            buffer_size,
            state: RendererState::default(),
            atlas,
            palette,
        })
    }
}

impl GridRenderer for Renderer {
    fn update_with_color_data(
        &mut self,
        table: ColorTable,
        cols: u32,
        rows: u32,
        cells: &[u8],
    ) -> Result<(), RenderError> {
        self.state
            .color_table_mut(table)
            .update(table.name(), cols, rows, cells)
    }

    fn update_with_char_data(
        &mut self,
        cols: u32,
        rows: u32,
        cells: &[u8],
    ) -> Result<(), RenderError> {
        self.state.chars_table.update("chars", cols, rows, cells)
    }

    fn render(&mut self, size: VirtualScreenSize, rows: u32, cols: u32) -> Result<(), RenderError> {
        if size.is_empty() {
            return Ok(());
        }
        if size != self.buffer_size {
            self.pixels
                .resize_buffer(size.width, size.height)
                .map_err(RenderError::Texture)?;
            self.buffer_size = size;
            debug!(width = size.width, height = size.height, "virtual_screen_resized");
        }

        compose_grid(
            self.pixels.frame_mut(),
            size,
            rows,
            cols,
            &self.state,
            &self.atlas,
            &self.palette,
        );
        self.pixels.render().map_err(RenderError::Surface)
    }

    /// Blocks until the queue drained. The poll result only says whether
    /// the queue was already empty and carries no error.
    fn finish(&mut self) -> Result<(), RenderError> {
        let _drained = self.pixels.device().poll(wgpu::Maintain::Wait);
        Ok(())
    }

    fn resize_to_display_size(&mut self) -> Result<bool, RenderError> {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Ok(false);
        }
        if (size.width, size.height) == self.surface_size {
            return Ok(false);
        }

        self.pixels
            .resize_surface(size.width, size.height)
            .map_err(RenderError::Texture)?;
        self.surface_size = (size.width, size.height);
        info!(width = size.width, height = size.height, "surface_resized");
        Ok(true)
    }
}
