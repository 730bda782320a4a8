//! BR Code payload assembly.
//!
//! This module builds the EMV-MPM-derived TLV text payload scanned by Pix
//! wallets: every field is a 2-digit identifier, a 2-digit decimal byte
//! length, and a value of exactly that length, rendered in a fixed canonical
//! order and terminated by a CRC-16 field computed over everything before it.

use crate::crc16;
use crate::error::PixError;

/*---- Payment-scheme profile ----*/

/// Payload format indicator (field 00) carried by every BR Code.
pub const PAYLOAD_FORMAT_INDICATOR: &str = "01";

/// Point of initiation (field 01) for a reusable code: the same code is
/// presented for many payments.
pub const POI_REUSABLE: &str = "11";

/// Point of initiation (field 01) for a single-use code. Advisory metadata
/// only; wallets are expected to honor it but nothing here enforces it.
pub const POI_SINGLE_USE: &str = "12";

/// Globally unique identifier of the Pix arrangement (sub-field 00 of the
/// merchant account information template).
pub const PIX_GUI: &str = "br.gov.bcb.pix";

/// Merchant category code (field 52); "0000" means not informed.
pub const MERCHANT_CATEGORY_CODE: &str = "0000";

/// ISO 4217 numeric code for the Brazilian real (field 53).
pub const CURRENCY_BRL: &str = "986";

/// ISO 3166-1 alpha-2 country code (field 58).
pub const COUNTRY_CODE: &str = "BR";

/// Sentinel transaction id (sub-field 05 of the additional data template)
/// meaning "no reference id".
pub const TXID_NONE: &str = "***";

/// Maximum byte length of any TLV value (the length field has 2 digits).
pub const MAX_FIELD_LEN: usize = 99;

/// Maximum byte length of the merchant name (field 59).
pub const MAX_NAME_LEN: usize = 25;

/// Maximum byte length of the merchant city (field 60).
pub const MAX_CITY_LEN: usize = 15;

/// Maximum byte length of the transaction id (sub-field 05 of field 62).
pub const MAX_TXID_LEN: usize = 25;

/// Maximum byte length of a registered payment key.
pub const MAX_KEY_LEN: usize = 77;

/// The inputs for one payment request.
///
/// `fullname`, `key`, and `city` are required; everything else is optional.
/// An absent `value` produces a pay-what-you-want code with no amount field,
/// and an absent `txid` falls back to the scheme's [`TXID_NONE`] sentinel.
#[derive(Debug, Clone, Default)]
pub struct PixRequest {
    /// Recipient display name, at most 25 bytes.
    pub fullname: String,
    /// Registered payment key (e-mail, phone, document, or random key).
    /// Copied verbatim; only non-emptiness is checked.
    pub key: String,
    /// Recipient city, at most 15 bytes.
    pub city: String,
    /// Transaction amount in BRL. Must be positive when present.
    pub value: Option<f64>,
    /// `true` produces a reusable code accepting many payments, `false` a
    /// single-use code.
    pub mult_transaction: bool,
    /// Free-text description embedded in the merchant account information.
    pub description: Option<String>,
    /// Transaction reference id, at most 25 bytes.
    pub txid: Option<String>,
}

/// Builds the complete BR Code payload text for the given request.
///
/// Fields are rendered in the canonical order expected by verifying
/// scanners, and the trailing CRC field covers every preceding character
/// including its own "6304" prefix.
///
/// # Errors
///
/// Returns [`PixError::Validation`] before any encoding work when a required
/// field is empty, the amount is not positive, or a field exceeds its
/// maximum encodable length.
pub fn build_payload(req: &PixRequest) -> Result<String, PixError> {
    validate(req)?;

    let mut payload = String::new();
    payload += &emit("00", PAYLOAD_FORMAT_INDICATOR)?;
    payload += &emit(
        "01",
        if req.mult_transaction { POI_REUSABLE } else { POI_SINGLE_USE },
    )?;
    payload += &emit("26", &merchant_account_information(req)?)?;
    payload += &emit("52", MERCHANT_CATEGORY_CODE)?;
    payload += &emit("53", CURRENCY_BRL)?;
    if let Some(value) = req.value {
        payload += &emit("54", &format_amount(value))?;
    }
    payload += &emit("58", COUNTRY_CODE)?;
    payload += &emit("59", &req.fullname)?;
    payload += &emit("60", &req.city)?;
    payload += &emit("62", &additional_data(req)?)?;

    // The CRC covers everything up to and including its own id+length prefix
    payload += "6304";
    let crc = crc16::checksum_hex(payload.as_bytes());
    payload += &crc;
    Ok(payload)
}

/// Renders one TLV field: 2-digit id, 2-digit byte length, value.
fn emit(id: &str, value: &str) -> Result<String, PixError> {
    debug_assert_eq!(id.len(), 2);
    let len = value.len();
    if len > MAX_FIELD_LEN {
        return Err(PixError::validation(
            "field",
            format!("value of field {id} is {len} bytes, above the {MAX_FIELD_LEN}-byte maximum"),
        ));
    }
    Ok(format!("{id}{len:02}{value}"))
}

/// Renders the merchant account information template (field 26): the Pix
/// GUI, the recipient key, and the optional description as sub-fields.
fn merchant_account_information(req: &PixRequest) -> Result<String, PixError> {
    let mut info = emit("00", PIX_GUI)?;
    info += &emit("01", &req.key)?;
    if let Some(description) = &req.description {
        info += &emit("02", description)?;
    }
    if info.len() > MAX_FIELD_LEN {
        // The GUI and key are fixed-size in practice, so the description is
        // what pushed the template over
        return Err(PixError::validation(
            "description",
            format!(
                "merchant account information is {} bytes, above the {MAX_FIELD_LEN}-byte \
                 maximum; shorten the description",
                info.len()
            ),
        ));
    }
    Ok(info)
}

/// Renders the additional data template (field 62) holding the transaction
/// id, or the scheme's sentinel when none was given.
fn additional_data(req: &PixRequest) -> Result<String, PixError> {
    let txid = req.txid.as_deref().unwrap_or(TXID_NONE);
    emit("05", txid)
}

/// Renders the amount with exactly two fraction digits and a period
/// separator, independent of locale.
fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

fn validate(req: &PixRequest) -> Result<(), PixError> {
    if req.fullname.is_empty() {
        return Err(PixError::validation("fullname", "must not be empty"));
    }
    if req.fullname.len() > MAX_NAME_LEN {
        return Err(PixError::validation(
            "fullname",
            format!("is {} bytes, above the {MAX_NAME_LEN}-byte maximum", req.fullname.len()),
        ));
    }
    if req.city.is_empty() {
        return Err(PixError::validation("city", "must not be empty"));
    }
    if req.city.len() > MAX_CITY_LEN {
        return Err(PixError::validation(
            "city",
            format!("is {} bytes, above the {MAX_CITY_LEN}-byte maximum", req.city.len()),
        ));
    }
    if req.key.is_empty() {
        return Err(PixError::validation("key", "must not be empty"));
    }
    if req.key.len() > MAX_KEY_LEN {
        return Err(PixError::validation(
            "key",
            format!("is {} bytes, above the {MAX_KEY_LEN}-byte maximum", req.key.len()),
        ));
    }
    if let Some(value) = req.value {
        if !value.is_finite() || value <= 0.0 {
            return Err(PixError::validation("value", format!("{value} is not a positive amount")));
        }
    }
    if let Some(description) = &req.description {
        if description.len() > MAX_FIELD_LEN {
            return Err(PixError::validation(
                "description",
                format!("is {} bytes, above the {MAX_FIELD_LEN}-byte maximum", description.len()),
            ));
        }
    }
    if let Some(txid) = &req.txid {
        if txid.len() > MAX_TXID_LEN {
            return Err(PixError::validation(
                "txid",
                format!("is {} bytes, above the {MAX_TXID_LEN}-byte maximum", txid.len()),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_request() -> PixRequest {
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

    /// Walks the TLV stream, returning (id, value) pairs and asserting that
    /// every declared length matches the value's byte length exactly.
    fn walk_tlv(payload: &str) -> Vec<(String, String)> {
        let bytes = payload.as_bytes();
        let mut fields = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let id = std::str::from_utf8(&bytes[pos..pos + 2]).unwrap();
            let len: usize =
                std::str::from_utf8(&bytes[pos + 2..pos + 4]).unwrap().parse().unwrap();
            let value = std::str::from_utf8(&bytes[pos + 4..pos + 4 + len]).unwrap();
            assert_eq!(value.len(), len, "field {id} length mismatch");
            fields.push((id.to_string(), value.to_string()));
            pos += 4 + len;
        }
        assert_eq!(pos, bytes.len(), "trailing bytes after last field");
        fields
    }

    #[test]
    fn test_payload_is_deterministic() {
        let req = sample_request();
        assert_eq!(build_payload(&req).unwrap(), build_payload(&req).unwrap());
    }

    #[test]
    fn test_crc_recomputes_over_stripped_payload() {
        let payload = build_payload(&sample_request()).unwrap();
        let (body, crc) = payload.split_at(payload.len() - 4);
        assert!(body.ends_with("6304"));
        assert_eq!(crc, crc16::checksum_hex(body.as_bytes()));
    }

    #[test]
    fn test_field_order_and_lengths() {
        let payload = build_payload(&sample_request()).unwrap();
        let ids: Vec<String> = walk_tlv(&payload).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["00", "01", "26", "52", "53", "54", "58", "59", "60", "62", "63"]);
    }

    #[test]
    fn test_nested_templates_are_valid_tlv() {
        let payload = build_payload(&sample_request()).unwrap();
        let fields = walk_tlv(&payload);
        let account = &fields.iter().find(|(id, _)| id == "26").unwrap().1;
        let subs = walk_tlv(account);
        assert_eq!(subs[0], ("00".to_string(), PIX_GUI.to_string()));
        assert_eq!(subs[1].0, "01");
        assert_eq!(subs[1].1, "406c5d72-e8e1-40dd-87a9-f7846d08f9e1");
        assert_eq!(subs[2], ("02".to_string(), "A shot of cachaça!".to_string()));
        let additional = &fields.iter().find(|(id, _)| id == "62").unwrap().1;
        assert_eq!(walk_tlv(additional), [("05".to_string(), TXID_NONE.to_string())]);
    }

    #[test]
    fn test_point_of_initiation_codes() {
        let mut req = sample_request();
        req.mult_transaction = true;
        assert!(build_payload(&req).unwrap().contains("010211"));
        req.mult_transaction = false;
        assert!(build_payload(&req).unwrap().contains("010212"));
    }

    #[test]
    fn test_amount_formatting() {
        let mut req = sample_request();
        req.value = Some(3.00);
        assert!(build_payload(&req).unwrap().contains("54043.00"));
        req.value = Some(0.5);
        assert!(build_payload(&req).unwrap().contains("54040.50"));
        req.value = Some(1234.5);
        assert!(build_payload(&req).unwrap().contains("54071234.50"));
    }

    #[test]
    fn test_amount_field_absent_when_value_omitted() {
        let mut req = sample_request();
        req.value = None;
        let payload = build_payload(&req).unwrap();
        assert!(walk_tlv(&payload).iter().all(|(id, _)| id != "54"));
    }

    #[test]
    fn test_description_field_absent_when_omitted() {
        let mut req = sample_request();
        req.description = None;
        let payload = build_payload(&req).unwrap();
        let fields = walk_tlv(&payload);
        let account = &fields.iter().find(|(id, _)| id == "26").unwrap().1;
        assert!(walk_tlv(account).iter().all(|(id, _)| id != "02"));
    }

    #[test]
    fn test_explicit_txid_replaces_sentinel() {
        let mut req = sample_request();
        req.txid = Some("INVOICE42".to_string());
        let payload = build_payload(&req).unwrap();
        assert!(payload.contains("62130509INVOICE42"));
    }

    #[test]
    fn test_known_payload_prefix() {
        let payload = build_payload(&sample_request()).unwrap();
        assert!(payload.starts_with("000201010211"));
        assert!(payload.contains("0014br.gov.bcb.pix"));
        assert!(payload.contains("5204000053039865404"));
        assert!(payload.contains("5802BR5923Vinicius Fonseca Maciel6014Patos de Minas"));
    }

    #[test]
    fn test_empty_fullname_rejected() {
        let mut req = sample_request();
        req.fullname = String::new();
        assert!(matches!(
            build_payload(&req),
            Err(PixError::Validation { field: "fullname", .. })
        ));
    }

    #[test]
    fn test_overlong_fullname_rejected_not_truncated() {
        let mut req = sample_request();
        req.fullname = "A name far too long to fit the twenty-five-byte field".to_string();
        assert!(matches!(
            build_payload(&req),
            Err(PixError::Validation { field: "fullname", .. })
        ));
    }

    #[test]
    fn test_overlong_city_rejected() {
        let mut req = sample_request();
        req.city = "Vila Bela da Santissima Trindade".to_string();
        assert!(matches!(build_payload(&req), Err(PixError::Validation { field: "city", .. })));
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut req = sample_request();
        req.key = String::new();
        assert!(matches!(build_payload(&req), Err(PixError::Validation { field: "key", .. })));
    }

    #[test]
    fn test_non_positive_value_rejected() {
        let mut req = sample_request();
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            req.value = Some(bad);
            assert!(matches!(
                build_payload(&req),
                Err(PixError::Validation { field: "value", .. })
            ));
        }
    }

    #[test]
    fn test_overlong_description_reported_as_culprit() {
        let mut req = sample_request();
        req.description = Some("x".repeat(60));
        assert!(matches!(
            build_payload(&req),
            Err(PixError::Validation { field: "description", .. })
        ));
    }

    #[test]
    fn test_overlong_txid_rejected() {
        let mut req = sample_request();
        req.txid = Some("x".repeat(26));
        assert!(matches!(build_payload(&req), Err(PixError::Validation { field: "txid", .. })));
    }
}
