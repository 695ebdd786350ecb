use std::path::Path;

use image::ImageReader;

use crate::manifest::GridSize;

use super::RenderError;

/// Glyph sheet addressed by byte value, laid out left to right then top to
/// bottom. Coverage is the luminance of each pixel weighted by its alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAtlas {
    width: u32,
    glyph: GridSize,
    glyphs_per_row: u32,
    glyph_count: usize,
    coverage: Vec<u8>,
}

impl FontAtlas {
    pub fn load(path: &Path, glyph: GridSize) -> Result<Self, RenderError> {
        let reader = ImageReader::open(path).map_err(|source| RenderError::AtlasOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| RenderError::AtlasDecode {
            path: path.to_path_buf(),
            source,
        })?;
        let image = decoded.to_rgba8();
        let (width, height) = image.dimensions();
        let coverage = image
            .pixels()
            .map(|pixel| {
                let [r, g, b, a] = pixel.0;
                let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
                (luma * u32::from(a) / 255) as u8
            })
            .collect();
        Self::from_coverage(width, height, coverage, glyph)
    }

    pub fn from_coverage(
        width: u32,
        height: u32,
        coverage: Vec<u8>,
        glyph: GridSize,
    ) -> Result<Self, RenderError> {
        let geometry_error = || RenderError::AtlasGeometry {
            atlas_width: width,
            atlas_height: height,
            glyph_width: glyph.width,
            glyph_height: glyph.height,
        };
        if glyph.width == 0 || glyph.height == 0 {
            return Err(geometry_error());
        }
        let glyphs_per_row = width / glyph.width;
        let glyph_rows = height / glyph.height;
        if glyphs_per_row == 0 || glyph_rows == 0 {
            return Err(geometry_error());
        }
        if coverage.len() != width as usize * height as usize {
            return Err(geometry_error());
        }

        Ok(Self {
            width,
            glyph,
            glyphs_per_row,
            glyph_count: glyphs_per_row as usize * glyph_rows as usize,
            coverage,
        })
    }

    pub fn glyph_size(&self) -> GridSize {
        self.glyph
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    /// Coverage of pixel (`x`, `y`) inside `glyph`. Glyphs missing from the
    /// sheet and pixels outside the cell are blank.
    pub fn coverage(&self, glyph: u8, x: u32, y: u32) -> u8 {
        if glyph as usize >= self.glyph_count || x >= self.glyph.width || y >= self.glyph.height {
            return 0;
        }
        let glyph = u32::from(glyph);
        let origin_x = (glyph % self.glyphs_per_row) * self.glyph.width;
        let origin_y = (glyph / self.glyphs_per_row) * self.glyph.height;
        let index = (origin_y + y) as usize * self.width as usize + (origin_x + x) as usize;
        self.coverage[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLYPH: GridSize = GridSize {
        width: 2,
        height: 2,
    };

    // 4x2 sheet holding two 2x2 glyphs: glyph 0 blank, glyph 1 a diagonal.
    fn two_glyph_atlas() -> FontAtlas {
        let coverage = vec![
            0, 0, 255, 0, //
            0, 0, 0, 255,
        ];
        FontAtlas::from_coverage(4, 2, coverage, GLYPH).expect("atlas")
    }

    #[test]
    fn glyphs_are_addressed_left_to_right() {
        let atlas = two_glyph_atlas();
        assert_eq!(atlas.glyph_count(), 2);
        assert_eq!(atlas.coverage(0, 0, 0), 0);
        assert_eq!(atlas.coverage(1, 0, 0), 255);
        assert_eq!(atlas.coverage(1, 1, 0), 0);
        assert_eq!(atlas.coverage(1, 1, 1), 255);
    }

    #[test]
    fn missing_glyphs_and_out_of_cell_pixels_are_blank() {
        let atlas = two_glyph_atlas();
        assert_eq!(atlas.coverage(200, 0, 0), 0);
        assert_eq!(atlas.coverage(1, 2, 0), 0);
    }

    #[test]
    fn sheet_smaller_than_a_glyph_is_rejected() {
        let err = FontAtlas::from_coverage(1, 1, vec![0], GLYPH).expect_err("too small");
        assert!(matches!(err, RenderError::AtlasGeometry { .. }));
    }

    #[test]
    fn coverage_length_must_match_sheet() {
        let err = FontAtlas::from_coverage(4, 2, vec![0; 7], GLYPH).expect_err("short buffer");
        assert!(matches!(err, RenderError::AtlasGeometry { .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FontAtlas::load(&dir.path().join("font.png"), GLYPH).expect_err("missing");
        assert!(matches!(err, RenderError::AtlasOpen { .. }));
    }

    #[test]
    fn load_decodes_png_sheet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("font.png");
        let mut sheet = image::RgbaImage::new(4, 2);
        sheet.put_pixel(2, 0, image::Rgba([255, 255, 255, 255]));
        sheet.put_pixel(3, 1, image::Rgba([255, 255, 255, 0]));
        sheet.save(&path).expect("save png");

        let atlas = FontAtlas::load(&path, GLYPH).expect("atlas");
        assert_eq!(atlas.coverage(1, 0, 0), 255);
        assert_eq!(atlas.coverage(1, 1, 1), 0);
    }
}
