//! Lenient web-safe base64 decoding for body and attachment payloads.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// URL-safe alphabet; accepts payloads with or without `=` padding.
const URL_SAFE_ANY_PAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a Gmail `data` field.
///
/// Malformed input yields an empty buffer. A listing must survive one bad
/// body, so the failure is only logged.
pub fn decode_payload(data: &str) -> Vec<u8> {
    match URL_SAFE_ANY_PAD.decode(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, len = data.len(), "Ignoring undecodable base64 payload");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_padded() {
        assert_eq!(decode_payload("SW5uZXIgdGV4dA=="), b"Inner text");
    }

    #[test]
    fn test_decode_unpadded() {
        assert_eq!(decode_payload("SW5uZXIgdGV4dA"), b"Inner text");
    }

    #[test]
    fn test_decode_url_safe_alphabet() {
        assert_eq!(
            decode_payload("PGRpdj5Jbm5lciBodG1sPC9kaXY-"),
            b"<div>Inner html</div>"
        );
    }

    #[test]
    fn test_standard_alphabet_is_rejected() {
        // '+' belongs to the standard alphabet only.
        assert!(decode_payload("PGRpdj5Jbm5lciBodG1sPC9kaXY+").is_empty());
    }

    #[test]
    fn test_malformed_yields_empty() {
        assert!(decode_payload("this is not base64!").is_empty());
        assert!(decode_payload("").is_empty());
    }
}
