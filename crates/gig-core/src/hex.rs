//! # Hex Codecs
//!
//! `0x`-prefixed hex encoding and decoding shared by the JSON-RPC transport
//! and the ABI word codec. JSON-RPC quantities (block numbers, balances,
//! status words) travel as minimal hex integers; call data and event data
//! travel as even-length hex byte strings.

use crate::error::ValidationError;

/// Decode a `0x`-prefixed hex byte string. An empty payload (`0x`) decodes
/// to an empty vector.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, ValidationError> {
    let digits = value.strip_prefix("0x").ok_or_else(|| ValidationError::InvalidHex {
        reason: format!("missing 0x prefix: {value}"),
    })?;
    if digits.len() % 2 != 0 {
        return Err(ValidationError::InvalidHex {
            reason: format!("odd-length hex string ({} digits)", digits.len()),
        });
    }
    let mut out = Vec::with_capacity(digits.len() / 2);
    for chunk in digits.as_bytes().chunks(2) {
        let hi = hex_digit(chunk[0])?;
        let lo = hex_digit(chunk[1])?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

/// Parse a JSON-RPC quantity (`0x`-prefixed hex integer) into a `u64`.
pub fn parse_quantity(value: &str) -> Result<u64, ValidationError> {
    let digits = value.strip_prefix("0x").ok_or_else(|| ValidationError::InvalidQuantity {
        value: value.to_string(),
    })?;
    u64::from_str_radix(digits, 16).map_err(|_| ValidationError::InvalidQuantity {
        value: value.to_string(),
    })
}

/// Parse a JSON-RPC quantity into a `u128` (token amounts).
pub fn parse_quantity_u128(value: &str) -> Result<u128, ValidationError> {
    let digits = value.strip_prefix("0x").ok_or_else(|| ValidationError::InvalidQuantity {
        value: value.to_string(),
    })?;
    u128::from_str_radix(digits, 16).map_err(|_| ValidationError::InvalidQuantity {
        value: value.to_string(),
    })
}

/// Encode a `u64` as a minimal JSON-RPC quantity.
pub fn encode_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

/// Encode a `u128` as a minimal JSON-RPC quantity.
pub fn encode_quantity_u128(value: u128) -> String {
    format!("0x{value:x}")
}

fn hex_digit(c: u8) -> Result<u8, ValidationError> {
    (c as char)
        .to_digit(16)
        .map(|d| d as u8)
        .ok_or_else(|| ValidationError::InvalidHex {
            reason: format!("invalid hex digit: {}", c as char),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_empty_payload() {
        assert_eq!(decode_hex("0x").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn decode_rejects_missing_prefix() {
        assert!(decode_hex("deadbeef").is_err());
    }

    #[test]
    fn decode_rejects_odd_length() {
        assert!(decode_hex("0xabc").is_err());
    }

    #[test]
    fn decode_rejects_bad_digit() {
        assert!(decode_hex("0xzz").is_err());
    }

    #[test]
    fn quantity_roundtrip() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x1").unwrap(), 1);
        assert_eq!(parse_quantity("0xff").unwrap(), 255);
        assert_eq!(encode_quantity(255), "0xff");
        assert_eq!(parse_quantity(&encode_quantity(u64::MAX)).unwrap(), u64::MAX);
    }

    #[test]
    fn quantity_u128_roundtrip() {
        let big = 1_000_000_000_000_000_000_000u128;
        assert_eq!(parse_quantity_u128(&encode_quantity_u128(big)).unwrap(), big);
    }

    #[test]
    fn quantity_rejects_decimal() {
        assert!(parse_quantity("1000").is_err());
    }

    proptest! {
        #[test]
        fn hex_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            let encoded = encode_hex(&bytes);
            prop_assert_eq!(decode_hex(&encoded).unwrap(), bytes);
        }
    }
}
