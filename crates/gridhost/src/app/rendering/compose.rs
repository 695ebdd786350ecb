use crate::manifest::Palette;

use super::font_atlas::FontAtlas;
use super::tables::RendererState;
use super::transform::{cell_origin_px, VirtualScreenSize};

/// Rasterizes every cell of the grid into an RGBA frame of `size`.
///
/// Each pixel blends the cell's foreground over its background by the glyph
/// coverage. Cells beyond the frame are clipped.
pub(crate) fn compose_grid(
    frame: &mut [u8],
    size: VirtualScreenSize,
    rows: u32,
    cols: u32,
    state: &RendererState,
    atlas: &FontAtlas,
    palette: &Palette,
) {
    if size.is_empty() || frame.len() < size.pixel_count() * 4 {
        return;
    }

    let cell = atlas.glyph_size();
    for row in 0..rows {
        for col in 0..cols {
            let glyph = state.chars_table.get(col, row);
            let fg = palette.color(state.fg_color_table.get(col, row));
            let bg = palette.color(state.bg_color_table.get(col, row));
            let (origin_x, origin_y) = cell_origin_px(col, row, cell);

            for y in 0..cell.height {
                let pixel_y = origin_y + y;
                if pixel_y >= size.height {
                    break;
                }
                for x in 0..cell.width {
                    let pixel_x = origin_x + x;
                    if pixel_x >= size.width {
                        break;
                    }
                    let color = blend(bg, fg, atlas.coverage(glyph, x, y));
                    let offset = (pixel_y as usize * size.width as usize + pixel_x as usize) * 4;
                    frame[offset..offset + 4].copy_from_slice(&color);
                }
            }
        }
    }
}

fn blend(bg: [u8; 4], fg: [u8; 4], coverage: u8) -> [u8; 4] {
    match coverage {
        0 => bg,
        255 => fg,
        _ => {
            let t = u32::from(coverage);
            let mix = |b: u8, f: u8| ((u32::from(b) * (255 - t) + u32::from(f) * t) / 255) as u8;
            [
                mix(bg[0], fg[0]),
                mix(bg[1], fg[1]),
                mix(bg[2], fg[2]),
                mix(bg[3], fg[3]),
            ]
        }
    }
}
