//! End-to-end flow: request fields in, payload text and exported images out.

use pixrust::crc16;
use pixrust::{Pix, PixError, PixRequest, RenderOptions};

fn cachaca_request() -> PixRequest {
    PixRequest {
        fullname: "Vinicius Fonseca Maciel".to_string(),
        key: "406c5d72-e8e1-40dd-87a9-f7846d08f9e1".to_string(),
        city: "Patos de Minas".to_string(),
        value: Some(3.00),
        mult_transaction: true,
        description: Some("A shot of cachaça!".to_string()),
        txid: None,
    }
}

#[test]
fn payload_shape_and_checksum() {
    let pix = Pix::generate(cachaca_request()).unwrap();
    let payload = pix.payload();

    assert!(!payload.is_empty());
    assert!(payload.starts_with("000201"));
    assert!(payload.contains("406c5d72-e8e1-40dd-87a9-f7846d08f9e1"));

    // Ends in 4 hex digits that reproduce the checksum of everything before them
    let (body, crc) = payload.split_at(payload.len() - 4);
    assert!(crc.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    assert!(body.ends_with("6304"));
    assert_eq!(crc, crc16::checksum_hex(body.as_bytes()));
}

#[test]
fn generation_is_deterministic() {
    let a = Pix::generate(cachaca_request()).unwrap();
    let b = Pix::generate(cachaca_request()).unwrap();
    assert_eq!(a.payload(), b.payload());
    assert_eq!(a.to_png_bytes().unwrap(), b.to_png_bytes().unwrap());
    assert_eq!(a.to_svg().unwrap(), b.to_svg().unwrap());
}

#[test]
fn symbol_is_square_and_consistent_with_version() {
    let pix = Pix::generate(cachaca_request()).unwrap();
    let qr = pix.qr_code();
    assert_eq!(qr.size(), i32::from(qr.version().value()) * 4 + 17);
}

#[test]
fn png_and_base64_exports_agree() {
    let pix = Pix::generate(cachaca_request()).unwrap();
    let bytes = pix.to_png_bytes().unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    use base64::Engine as _;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(pix.to_base64().unwrap())
        .unwrap();
    assert_eq!(decoded, bytes);
}

#[test]
fn exports_write_both_formats() {
    let pix = Pix::generate(cachaca_request()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let dir_str = dir.path().to_str().unwrap();

    let svg_path = pix.image_to_path(Some(dir_str), Some("testingqrcode"), true).unwrap();
    assert_eq!(svg_path.extension().unwrap(), "svg");
    assert_eq!(std::fs::read_to_string(&svg_path).unwrap(), pix.to_svg().unwrap());

    let png_path = pix.image_to_path(Some(dir_str), Some("testingqrcode"), false).unwrap();
    assert_eq!(png_path.extension().unwrap(), "png");
    let png = std::fs::read(&png_path).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn export_uses_default_filename() {
    let pix = Pix::generate(cachaca_request()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = pix.image_to_path(Some(dir.path().to_str().unwrap()), None, false).unwrap();
    assert_eq!(path.file_name().unwrap(), "pix_qrcode.png");
}

#[test]
fn export_creates_missing_directories() {
    let pix = Pix::generate(cachaca_request()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let path = pix
        .image_to_path(Some(nested.to_str().unwrap()), Some("code"), true)
        .unwrap();
    assert!(path.exists());
}

#[test]
fn export_to_unwritable_path_fails() {
    let pix = Pix::generate(cachaca_request()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let occupied = dir.path().join("occupied");
    std::fs::write(&occupied, b"not a directory").unwrap();
    let target = occupied.join("nested");
    let result = pix.image_to_path(Some(target.to_str().unwrap()), None, false);
    assert!(matches!(result, Err(PixError::Io(_))));
}

#[test]
fn custom_render_options_flow_through_the_facade() {
    let pix = Pix::generate(cachaca_request()).unwrap();
    let opts = RenderOptions { module_size: 4, quiet_zone: 2, ..Default::default() };
    let svg = pix.to_svg_with(&opts).unwrap();
    let side = pix.qr_code().size() + 4;
    assert!(svg.contains(&format!("viewBox=\"0 0 {side} {side}\"")));
    assert!(pix.to_base64_with(&opts).unwrap().len() < pix.to_base64().unwrap().len());
}

#[test]
fn pay_what_you_want_code_has_no_amount() {
    let with_value = Pix::generate(cachaca_request()).unwrap();
    let mut req = cachaca_request();
    req.value = None;
    let without_value = Pix::generate(req).unwrap();

    assert!(with_value.payload().contains("54043.00"));
    assert!(!without_value.payload().contains("54043.00"));
    // The whole "54043.00" field is gone, nothing else moved
    assert_eq!(without_value.payload().len() + 8, with_value.payload().len());
}

#[test]
fn overlong_free_text_is_rejected_before_encoding() {
    let mut req = cachaca_request();
    req.description = Some("y".repeat(50));
    match Pix::generate(req) {
        Err(PixError::Validation { field, .. }) => assert_eq!(field, "description"),
        other => panic!("expected a validation error, got {:?}", other.map(|p| p.payload().len())),
    }
}
