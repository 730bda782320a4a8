//! The high-level entry point: build a payment request, get a payload and
//! its QR code, and export it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::error::PixError;
use crate::payload::{self, PixRequest};
use crate::qrcode::{QrCode, QrCodeEcc};
use crate::render::{self, RenderOptions};

/// Error correction level used for every generated code. Medium keeps the
/// symbol compact while surviving the smudges of printed media.
const ECC_LEVEL: QrCodeEcc = QrCodeEcc::Medium;

/// Directory used by [`Pix::image_to_path`] when none is given.
const DEFAULT_DIRECTORY: &str = "generated";

/// Base filename used by [`Pix::image_to_path`] when none is given.
const DEFAULT_FILENAME: &str = "pix_qrcode";

/// A generated Pix payment code: the BR Code payload text plus its QR symbol.
///
/// Built once by [`Pix::generate`] and immutable afterwards. `Display`
/// prints the payload text (the "copy and paste" form of the code).
///
/// # Example
///
/// ```rust
/// use pixrust::{Pix, PixRequest};
///
/// let pix = Pix::generate(PixRequest {
///     fullname: "Vinicius Fonseca Maciel".to_string(),
///     key: "406c5d72-e8e1-40dd-87a9-f7846d08f9e1".to_string(),
///     city: "Patos de Minas".to_string(),
///     value: Some(3.00),
///     mult_transaction: true,
///     description: Some("A shot of cachaça!".to_string()),
///     ..Default::default()
/// }).unwrap();
///
/// println!("{}", pix);          // the raw payload text
/// let svg = pix.to_svg().unwrap();
/// let b64 = pix.to_base64().unwrap();
/// ```
pub struct Pix {
    payload: String,
    qr: QrCode,
}

impl Pix {
    /// Validates the request, builds the payload, and encodes its QR symbol.
    ///
    /// # Errors
    ///
    /// Returns [`PixError::Validation`] for rejected inputs and
    /// [`PixError::Capacity`] if the combined free-text fields push the
    /// payload past the largest symbol's capacity.
    pub fn generate(req: PixRequest) -> Result<Pix, PixError> {
        let payload = payload::build_payload(&req)?;
        let qr = QrCode::encode_text(&payload, ECC_LEVEL)?;
        debug!(
            payload_len = payload.len(),
            version = qr.version().value(),
            size = qr.size(),
            "generated pix code"
        );
        Ok(Pix { payload, qr })
    }

    /// Returns the raw BR Code payload text.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns the encoded QR symbol.
    pub fn qr_code(&self) -> &QrCode {
        &self.qr
    }

    /// Returns the SVG document text for this code with default rendering
    /// options.
    pub fn to_svg(&self) -> Result<String, PixError> {
        self.to_svg_with(&RenderOptions::default())
    }

    /// Returns the SVG document text for this code.
    pub fn to_svg_with(&self, opts: &RenderOptions) -> Result<String, PixError> {
        render::render_svg(&self.qr, opts)
    }

    /// Returns the PNG-encoded raster image of this code with default
    /// rendering options.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, PixError> {
        self.to_png_bytes_with(&RenderOptions::default())
    }

    /// Returns the PNG-encoded raster image of this code.
    pub fn to_png_bytes_with(&self, opts: &RenderOptions) -> Result<Vec<u8>, PixError> {
        render::render_png(&self.qr, opts)
    }

    /// Returns the base64 encoding of the PNG image with default rendering
    /// options, suitable for inline embedding.
    pub fn to_base64(&self) -> Result<String, PixError> {
        self.to_base64_with(&RenderOptions::default())
    }

    /// Returns the base64 encoding of the PNG image.
    pub fn to_base64_with(&self, opts: &RenderOptions) -> Result<String, PixError> {
        Ok(STANDARD.encode(self.to_png_bytes_with(opts)?))
    }

    /// Saves this code as an image file and returns the written path.
    ///
    /// The extension is chosen by `svg`: `.svg` for the vector document,
    /// `.png` for the raster image. Missing directories are created.
    ///
    /// # Arguments
    ///
    /// * `directory` - Target directory; defaults to `"generated"`.
    /// * `filename` - Base filename without extension; defaults to
    ///   `"pix_qrcode"`.
    /// * `svg` - Whether to write the vector document instead of the raster
    ///   image.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors (unwritable path, disk full) untouched.
    pub fn image_to_path(
        &self,
        directory: Option<&str>,
        filename: Option<&str>,
        svg: bool,
    ) -> Result<PathBuf, PixError> {
        self.image_to_path_with(directory, filename, svg, &RenderOptions::default())
    }

    /// Saves this code as an image file with the given rendering options.
    pub fn image_to_path_with(
        &self,
        directory: Option<&str>,
        filename: Option<&str>,
        svg: bool,
        opts: &RenderOptions,
    ) -> Result<PathBuf, PixError> {
        let directory = Path::new(directory.unwrap_or(DEFAULT_DIRECTORY));
        let filename = filename.unwrap_or(DEFAULT_FILENAME);
        if !directory.exists() {
            fs::create_dir_all(directory)?;
        }

        let extension = if svg { "svg" } else { "png" };
        let path = directory.join(format!("{filename}.{extension}"));
        if svg {
            fs::write(&path, self.to_svg_with(opts)?)?;
        } else {
            render::render_image(&self.qr, opts)?.save(&path)?;
        }
        debug!(path = %path.display(), "wrote qr image");
        Ok(path)
    }
}

impl fmt::Display for Pix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}
