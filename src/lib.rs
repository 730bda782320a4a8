#![forbid(unsafe_code)]
//! # pixrust
//!
//! A Rust library for generating Pix BR Code payment payloads and rendering
//! them as QR codes.
//!
//! `pixrust` assembles the EMV-MPM-derived TLV payload used by the Brazilian
//! instant-payment system (recipient key, name, city, optional amount and
//! description, CRC-16 trailer), encodes it as a QR Code Model 2 symbol
//! (versions 1 to 40, four error correction levels), and renders the symbol
//! as a PNG image, an SVG document, or a base64 string — all without any
//! server round-trip.
//!
//! ## Features
//!
//! - Build spec-compliant BR Code payloads with validated fields.
//! - Single-use or reusable (multi-transaction) payment codes.
//! - Full QR encoder: numeric, alphanumeric, and byte modes, Reed–Solomon
//!   error correction, automatic mask selection.
//! - Export as PNG file, SVG file, in-memory PNG bytes, or base64.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! pixrust = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use pixrust::{Pix, PixRequest};
//!
//! fn main() -> Result<(), pixrust::PixError> {
//!     let pix = Pix::generate(PixRequest {
//!         fullname: "Vinicius Fonseca Maciel".to_string(),
//!         key: "406c5d72-e8e1-40dd-87a9-f7846d08f9e1".to_string(),
//!         city: "Patos de Minas".to_string(),
//!         value: Some(3.00),
//!         mult_transaction: true,
//!         description: Some("A shot of cachaça!".to_string()),
//!         ..Default::default()
//!     })?;
//!
//!     pix.image_to_path(Some("."), Some("testingqrcode"), true)?;  // ./testingqrcode.svg
//!     pix.image_to_path(Some("."), Some("testingqrcode"), false)?; // ./testingqrcode.png
//!     println!("{}", pix.to_base64()?);
//!     println!("{}", pix); // the payload text behind the QR code
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`crc16`]: CRC-16/CCITT-FALSE checksum of the payload's trailing field.
//! - [`payload`]: BR Code TLV payload assembly and validation.
//! - [`qrcode`]: Core QR code encoding functionality.
//! - [`render`]: Raster and SVG rendering of an encoded symbol.
//! - [`pix`]: The high-level request facade.
//! - [`error`]: Error types.

pub mod crc16;
pub mod error;
pub mod payload;
pub mod pix;
pub mod qrcode;
pub mod render;

pub use error::PixError;
pub use payload::PixRequest;
pub use pix::Pix;
pub use render::RenderOptions;
