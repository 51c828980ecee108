//! Bitmap rendering output and render settings

use crate::error::{PdfError, Result};
use std::path::Path;

/// Pixel layout of a rendered image. Both formats carry straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// R, G, B, A byte order (PDFium's reverse-byte-order output)
    #[default]
    Rgba,
    /// B, G, R, A byte order (PDFium's native output)
    Bgra,
}

impl PixelFormat {
    /// Get the number of bytes per pixel for this format.
    pub fn bytes_per_pixel(self) -> usize {
        4
    }
}

/// Flags passed through to the backend renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderFlags {
    /// Draw annotation appearances
    pub annotations: bool,
    /// Sub-pixel text rendering
    pub lcd_text: bool,
    /// Emit RGBA instead of BGRA
    pub reverse_byte_order: bool,
    /// Render for printing
    pub printing: bool,
}

impl RenderFlags {
    /// Flags used for full-page images.
    pub fn page_image() -> Self {
        Self {
            annotations: true,
            lcd_text: true,
            reverse_byte_order: true,
            printing: false,
        }
    }

    /// Pixel format the backend produces for these flags.
    pub fn pixel_format(&self) -> PixelFormat {
        if self.reverse_byte_order {
            PixelFormat::Rgba
        } else {
            PixelFormat::Bgra
        }
    }
}

/// Configuration for page rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    flags: RenderFlags,
    /// Fill colour applied before rendering, as 0xRRGGBBAA
    background: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            flags: RenderFlags::page_image(),
            background: 0xFFFF_FFFF,
        }
    }
}

impl RenderConfig {
    /// Create a new render configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the renderer flags for full-page images.
    ///
    /// Default: annotations + LCD text, RGBA output
    pub fn set_flags(mut self, flags: RenderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the background fill, as 0xRRGGBBAA.
    ///
    /// Default: opaque white
    pub fn set_background(mut self, rgba: u32) -> Self {
        self.background = rgba;
        self
    }

    /// Get the renderer flags.
    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    /// Get the background fill.
    pub fn background(&self) -> u32 {
        self.background
    }
}

/// Affine page-to-bitmap matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    /// Scale from points to pixels at the given DPI, then shift so that the
    /// pixel `(x, y)` of the full-page raster lands at the bitmap origin.
    pub fn region(dpi_x: f32, dpi_y: f32, x: i32, y: i32) -> Self {
        Self {
            a: dpi_x / 72.0,
            b: 0.0,
            c: 0.0,
            d: dpi_y / 72.0,
            e: -(x as f32),
            f: -(y as f32),
        }
    }
}

/// Clip rectangle in bitmap pixels (inclusive edges).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ClipRect {
    /// Clip covering a whole `width` x `height` bitmap.
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: width.saturating_sub(1) as f32,
            bottom: height.saturating_sub(1) as f32,
        }
    }
}

/// A rendered page or page region.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PageImage {
    /// Allocate a `width` x `height` image filled with `rgba` (0xRRGGBBAA).
    pub fn filled(width: u32, height: u32, format: PixelFormat, rgba: u32) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        let [r, g, b, a] = rgba.to_be_bytes();
        let pixel = match format {
            PixelFormat::Rgba => [r, g, b, a],
            PixelFormat::Bgra => [b, g, r, a],
        };
        let mut data = Vec::with_capacity(stride * height as usize);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&pixel);
        }
        Self {
            width,
            height,
            stride,
            format,
            data,
        }
    }

    /// A 0x0 image.
    pub fn empty() -> Self {
        Self::filled(0, 0, PixelFormat::Rgba, 0)
    }

    /// True for a 0x0 image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the (width, height) pair.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get the stride (bytes per row).
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Get the pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Get the raw pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable pixel data, for backends writing into the buffer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The pixel at `(x, y)` as `[r, g, b, a]`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride + x as usize * 4;
        let px = &self.data[offset..offset + 4];
        Some(match self.format {
            PixelFormat::Rgba => [px[0], px[1], px[2], px[3]],
            PixelFormat::Bgra => [px[2], px[1], px[0], px[3]],
        })
    }

    /// Convert to tightly packed RGBA data (copies and converts).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity((self.width * self.height * 4) as usize);
        for y in 0..self.height as usize {
            let row = &self.data[y * self.stride..y * self.stride + self.width as usize * 4];
            for px in row.chunks_exact(4) {
                match self.format {
                    PixelFormat::Rgba => rgba.extend_from_slice(px),
                    PixelFormat::Bgra => rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]),
                }
            }
        }
        rgba
    }

    /// Convert to tightly packed RGB data, dropping alpha.
    pub fn to_rgb(&self) -> Vec<u8> {
        self.to_rgba()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect()
    }

    /// Save the image as a PNG file.
    pub fn save_as_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use png::{BitDepth, ColorType, Encoder};
        use std::fs::File;
        use std::io::BufWriter;

        if self.is_empty() {
            return Err(PdfError::InvalidParameter(
                "cannot encode an empty image".to_string(),
            ));
        }

        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        let mut encoder = Encoder::new(writer, self.width, self.height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);

        let mut png_writer = encoder
            .write_header()
            .map_err(|e| PdfError::PngEncoding(e.to_string()))?;

        png_writer
            .write_image_data(&self.to_rgba())
            .map_err(|e| PdfError::PngEncoding(e.to_string()))?;

        Ok(())
    }

    /// Save the image as a JPEG file.
    ///
    /// # Arguments
    ///
    /// * `path` - Output file path
    /// * `quality` - JPEG quality (1-100)
    pub fn save_as_jpeg<P: AsRef<Path>>(&self, path: P, quality: u8) -> Result<()> {
        use jpeg_encoder::{ColorType as JpegColorType, Encoder};
        use std::fs::File;
        use std::io::BufWriter;

        if self.is_empty() || self.width > u16::MAX as u32 || self.height > u16::MAX as u32 {
            return Err(PdfError::InvalidParameter(format!(
                "cannot encode a {}x{} image as JPEG",
                self.width, self.height
            )));
        }

        let rgb = self.to_rgb();
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        let encoder = Encoder::new(writer, quality);
        encoder
            .encode(
                &rgb,
                self.width as u16,
                self.height as u16,
                JpegColorType::Rgb,
            )
            .map_err(|e| PdfError::JpegEncoding(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_image_byte_order() {
        let rgba = PageImage::filled(2, 1, PixelFormat::Rgba, 0x1122_33FF);
        assert_eq!(&rgba.data()[..4], &[0x11, 0x22, 0x33, 0xFF]);
        assert_eq!(rgba.pixel(1, 0), Some([0x11, 0x22, 0x33, 0xFF]));

        let bgra = PageImage::filled(2, 1, PixelFormat::Bgra, 0x1122_33FF);
        assert_eq!(&bgra.data()[..4], &[0x33, 0x22, 0x11, 0xFF]);
        assert_eq!(bgra.pixel(0, 0), Some([0x11, 0x22, 0x33, 0xFF]));
        assert_eq!(bgra.to_rgba(), rgba.to_rgba());
        assert_eq!(bgra.pixel(2, 0), None);
    }

    #[test]
    fn test_to_rgb_drops_alpha() {
        let img = PageImage::filled(3, 2, PixelFormat::Bgra, 0xFF00_0080);
        let rgb = img.to_rgb();
        assert_eq!(rgb.len(), 3 * 2 * 3);
        assert_eq!(&rgb[..3], &[0xFF, 0x00, 0x00]);
    }

    #[test]
    fn test_empty_image() {
        let img = PageImage::empty();
        assert!(img.is_empty());
        assert_eq!(img.size(), (0, 0));
        assert!(img.data().is_empty());
    }

    #[test]
    fn test_region_matrix_and_clip() {
        let m = Matrix::region(144.0, 72.0, 10, 20);
        assert_eq!(m.a, 2.0);
        assert_eq!(m.d, 1.0);
        assert_eq!(m.e, -10.0);
        assert_eq!(m.f, -20.0);

        let clip = ClipRect::covering(100, 50);
        assert_eq!(clip.right, 99.0);
        assert_eq!(clip.bottom, 49.0);
    }

    #[test]
    fn test_render_config_defaults() {
        let config = RenderConfig::new();
        assert!(config.flags().annotations);
        assert!(config.flags().lcd_text);
        assert_eq!(config.flags().pixel_format(), PixelFormat::Rgba);
        assert_eq!(config.background(), 0xFFFF_FFFF);

        let config = config
            .set_flags(RenderFlags::default())
            .set_background(0x0000_00FF);
        assert_eq!(config.flags().pixel_format(), PixelFormat::Bgra);
        assert_eq!(config.background(), 0x0000_00FF);
    }

    #[test]
    fn test_save_as_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let img = PageImage::filled(8, 4, PixelFormat::Rgba, 0xFFFF_FFFF);

        let png_path = dir.path().join("page.png");
        img.save_as_png(&png_path).unwrap();
        let bytes = std::fs::read(&png_path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let jpg_path = dir.path().join("page.jpg");
        img.save_as_jpeg(&jpg_path, 85).unwrap();
        let bytes = std::fs::read(&jpg_path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        assert!(PageImage::empty().save_as_png(dir.path().join("e.png")).is_err());
    }
}
