//! Rendering a QR symbol as raster pixels or SVG text.

use std::io::Cursor;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::PixError;
use crate::qrcode::QrCode;

/// Options shared by the raster and vector renderers.
///
/// Both outputs are deterministic pure functions of the symbol plus these
/// options: every dark module becomes one `module_size` square of the
/// foreground color, surrounded by `quiet_zone` modules of background border
/// on all four sides (the quiet zone is what lets scanners find the symbol).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Edge length of one module, in pixels. Must be at least 1.
    pub module_size: u32,
    /// Width of the border, in modules.
    pub quiet_zone: u32,
    /// RGB color of dark modules.
    pub foreground: [u8; 3],
    /// RGB color of light modules and the quiet zone.
    pub background: [u8; 3],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            module_size: 8,
            quiet_zone: 4,
            foreground: [0, 0, 0],
            background: [255, 255, 255],
        }
    }
}

impl RenderOptions {
    fn check(&self) -> Result<(), PixError> {
        if self.module_size == 0 {
            return Err(PixError::Render("module size must be at least 1 pixel".to_string()));
        }
        Ok(())
    }
}

/// Renders the given QR symbol into an RGB pixel buffer.
///
/// The output is square with an edge of
/// `(symbol size + 2 * quiet_zone) * module_size` pixels.
pub fn render_image(qr: &QrCode, opts: &RenderOptions) -> Result<RgbImage, PixError> {
    opts.check()?;
    let side = qr.size() as u32;
    let dimension = (side + 2 * opts.quiet_zone) * opts.module_size;
    let mut img: RgbImage = ImageBuffer::from_pixel(dimension, dimension, Rgb(opts.background));

    for y in 0..side {
        for x in 0..side {
            if qr.get_module(x as i32, y as i32) {
                let px = (x + opts.quiet_zone) * opts.module_size;
                let py = (y + opts.quiet_zone) * opts.module_size;
                for dy in 0..opts.module_size {
                    for dx in 0..opts.module_size {
                        img.put_pixel(px + dx, py + dy, Rgb(opts.foreground));
                    }
                }
            }
        }
    }
    Ok(img)
}

/// Renders the given QR symbol and encodes it as PNG bytes in memory.
pub fn render_png(qr: &QrCode, opts: &RenderOptions) -> Result<Vec<u8>, PixError> {
    let img = render_image(qr, opts)?;
    let mut bytes: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

/// Returns a string of SVG code depicting the given QR symbol.
///
/// The drawing geometry works in module units with one `h1v1h-1z` path
/// command per dark module; `module_size` only scales the document's
/// width/height attributes. The string always uses Unix newlines (\n),
/// regardless of the platform.
pub fn render_svg(qr: &QrCode, opts: &RenderOptions) -> Result<String, PixError> {
    opts.check()?;
    let border = opts.quiet_zone as i32;
    let dimension = qr.size() + border * 2;
    let pixels = dimension as u32 * opts.module_size;

    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{pixels}\" height=\"{pixels}\" viewBox=\"0 0 {dimension} {dimension}\" stroke=\"none\">\n"
    );
    result += &format!(
        "\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        hex_color(opts.background)
    );
    result += "\t<path d=\"";
    for y in 0..qr.size() {
        for x in 0..qr.size() {
            if qr.get_module(x, y) {
                if x != 0 || y != 0 {
                    result += " ";
                }
                result += &format!("M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }
    result += &format!("\" fill=\"{}\"/>\n", hex_color(opts.foreground));
    result += "</svg>\n";
    Ok(result)
}

fn hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::QrCodeEcc;

    fn sample_qr() -> QrCode {
        QrCode::encode_text("render test", QrCodeEcc::Medium).unwrap()
    }

    #[test]
    fn test_raster_dimensions_scale_with_options() {
        let qr = sample_qr();
        for (module_size, quiet_zone) in [(1, 0), (3, 2), (8, 4), (10, 1)] {
            let opts = RenderOptions { module_size, quiet_zone, ..Default::default() };
            let img = render_image(&qr, &opts).unwrap();
            let expected = (qr.size() as u32 + 2 * quiet_zone) * module_size;
            assert_eq!(img.dimensions(), (expected, expected));
        }
    }

    #[test]
    fn test_raster_is_deterministic() {
        let qr = sample_qr();
        let opts = RenderOptions::default();
        assert_eq!(render_image(&qr, &opts).unwrap(), render_image(&qr, &opts).unwrap());
    }

    #[test]
    fn test_quiet_zone_is_background() {
        let qr = sample_qr();
        let opts = RenderOptions::default();
        let img = render_image(&qr, &opts).unwrap();
        let border_pixels = opts.quiet_zone * opts.module_size;
        for i in 0..border_pixels {
            assert_eq!(img.get_pixel(i, 0), &Rgb(opts.background));
            assert_eq!(img.get_pixel(0, i), &Rgb(opts.background));
        }
    }

    #[test]
    fn test_custom_colors_are_used() {
        let qr = sample_qr();
        let opts = RenderOptions {
            foreground: [255, 165, 0],
            background: [15, 23, 42],
            ..Default::default()
        };
        let img = render_image(&qr, &opts).unwrap();
        // Top-left corner of the quiet zone, and the finder center
        assert_eq!(img.get_pixel(0, 0), &Rgb([15, 23, 42]));
        let finder = (3 + opts.quiet_zone) * opts.module_size;
        assert_eq!(img.get_pixel(finder, finder), &Rgb([255, 165, 0]));
    }

    #[test]
    fn test_png_bytes_have_png_signature() {
        let qr = sample_qr();
        let bytes = render_png(&qr, &RenderOptions::default()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_svg_shape() {
        let qr = sample_qr();
        let svg = render_svg(&qr, &RenderOptions::default()).unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("viewBox=\"0 0 29 29\"") || qr.size() != 21);
        assert!(svg.contains("fill=\"#000000\""));
        assert!(svg.contains("fill=\"#FFFFFF\""));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_zero_module_size_rejected() {
        let qr = sample_qr();
        let opts = RenderOptions { module_size: 0, ..Default::default() };
        assert!(matches!(render_image(&qr, &opts), Err(PixError::Render(_))));
        assert!(matches!(render_svg(&qr, &opts), Err(PixError::Render(_))));
    }
}
