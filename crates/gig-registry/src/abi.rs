//! # ABI Word Codec
//!
//! Minimal encoder/decoder for the 32-byte-word contract ABI, covering
//! exactly the types the marketplace contracts use: `address`, `uint256`
//! (carried as `u128`), `bool`, `bytes32`, and `string`.
//!
//! Static values occupy one head word each. A `string` puts an offset in
//! its head word and appends a length-prefixed, zero-padded payload to the
//! tail, per the standard head/tail layout.

use gig_core::Address;

use crate::error::CodecError;

const WORD: usize = 32;

/// The parameter types the codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    /// 20-byte address, right-aligned in its word.
    Address,
    /// Unsigned integer up to 128 bits, right-aligned.
    Uint,
    /// Boolean, 0 or 1 in the last byte.
    Bool,
    /// Opaque 32-byte word.
    Bytes32,
    /// Dynamic UTF-8 string.
    String,
}

impl AbiType {
    /// Whether values of this type live in the tail.
    pub fn is_dynamic(self) -> bool {
        matches!(self, Self::String)
    }

    /// Human-readable type name for error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Uint => "uint",
            Self::Bool => "bool",
            Self::Bytes32 => "bytes32",
            Self::String => "string",
        }
    }
}

/// A decoded or to-be-encoded ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(u128),
    Bool(bool),
    Bytes32([u8; 32]),
    String(String),
}

impl AbiValue {
    fn ty(&self) -> AbiType {
        match self {
            Self::Address(_) => AbiType::Address,
            Self::Uint(_) => AbiType::Uint,
            Self::Bool(_) => AbiType::Bool,
            Self::Bytes32(_) => AbiType::Bytes32,
            Self::String(_) => AbiType::String,
        }
    }

    /// Extract an address, or `None` for any other variant.
    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Self::Address(a) => Some(a),
            _ => None,
        }
    }

    /// Extract a uint, or `None` for any other variant.
    pub fn as_uint(&self) -> Option<u128> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract a bool, or `None` for any other variant.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract a string slice, or `None` for any other variant.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Encode a value list against its declared parameter types.
pub fn encode(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, CodecError> {
    if types.len() != values.len() {
        return Err(CodecError::ArityMismatch {
            expected: types.len(),
            actual: values.len(),
        });
    }
    for (index, (ty, value)) in types.iter().zip(values).enumerate() {
        if *ty != value.ty() {
            return Err(CodecError::TypeMismatch {
                index,
                expected: ty.name(),
                actual: value.ty().name(),
            });
        }
    }

    let head_size = types.len() * WORD;
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for value in values {
        match value {
            AbiValue::Address(a) => head.extend_from_slice(&address_word(a)),
            AbiValue::Uint(v) => head.extend_from_slice(&uint_word(*v)),
            AbiValue::Bool(v) => head.extend_from_slice(&uint_word(u128::from(*v))),
            AbiValue::Bytes32(w) => head.extend_from_slice(w),
            AbiValue::String(s) => {
                head.extend_from_slice(&uint_word((head_size + tail.len()) as u128));
                tail.extend_from_slice(&uint_word(s.len() as u128));
                tail.extend_from_slice(s.as_bytes());
                let pad = s.len().div_ceil(WORD) * WORD - s.len();
                tail.extend(std::iter::repeat(0u8).take(pad));
            }
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Decode data against the declared parameter types.
pub fn decode(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, CodecError> {
    let mut out = Vec::with_capacity(types.len());
    for (index, ty) in types.iter().enumerate() {
        let word = read_word(data, index * WORD, ty.name())?;
        out.push(match ty {
            AbiType::Address => AbiValue::Address(decode_address_word(&word)),
            AbiType::Uint => AbiValue::Uint(decode_uint_word(&word)?),
            AbiType::Bool => AbiValue::Bool(decode_bool_word(&word)?),
            AbiType::Bytes32 => AbiValue::Bytes32(word),
            AbiType::String => {
                let offset = decode_uint_word(&word)? as usize;
                AbiValue::String(decode_string_at(data, offset)?)
            }
        });
    }
    Ok(out)
}

/// Decode one value from a single 32-byte topic word. Dynamic types cannot
/// appear in topics.
pub fn decode_topic(ty: AbiType, word: &[u8; 32]) -> Result<AbiValue, CodecError> {
    match ty {
        AbiType::Address => Ok(AbiValue::Address(decode_address_word(word))),
        AbiType::Uint => Ok(AbiValue::Uint(decode_uint_word(word)?)),
        AbiType::Bool => Ok(AbiValue::Bool(decode_bool_word(word)?)),
        AbiType::Bytes32 => Ok(AbiValue::Bytes32(*word)),
        AbiType::String => Err(CodecError::TypeMismatch {
            index: 0,
            expected: "static topic type",
            actual: "string",
        }),
    }
}

/// An address left-padded into a full word.
pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&address.to_bytes());
    word
}

/// A `u128` right-aligned into a full word.
pub fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn decode_address_word(word: &[u8; 32]) -> Address {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Address::from_bytes(&bytes)
}

fn decode_uint_word(word: &[u8; 32]) -> Result<u128, CodecError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(CodecError::UintOverflow);
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

fn decode_bool_word(word: &[u8; 32]) -> Result<bool, CodecError> {
    if word[..31].iter().any(|b| *b != 0) {
        return Err(CodecError::InvalidBool);
    }
    match word[31] {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(CodecError::InvalidBool),
    }
}

fn decode_string_at(data: &[u8], offset: usize) -> Result<String, CodecError> {
    let len_word = read_word(data, offset, "string length")?;
    let len = decode_uint_word(&len_word)? as usize;
    let start = offset + WORD;
    let bytes = data
        .get(start..start + len)
        .ok_or_else(|| CodecError::Truncated {
            reason: format!("string payload of {len} bytes at offset {start}"),
        })?;
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}

fn read_word(data: &[u8], offset: usize, what: &str) -> Result<[u8; 32], CodecError> {
    let slice = data
        .get(offset..offset + WORD)
        .ok_or_else(|| CodecError::Truncated {
            reason: format!("{what} at offset {offset}"),
        })?;
    let mut word = [0u8; 32];
    word.copy_from_slice(slice);
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr() -> Address {
        Address::new("0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef").unwrap()
    }

    #[test]
    fn encode_static_values() {
        let data = encode(
            &[AbiType::Address, AbiType::Uint],
            &[AbiValue::Address(addr()), AbiValue::Uint(1000)],
        )
        .unwrap();
        assert_eq!(data.len(), 64);
        assert_eq!(&data[12..32], &addr().to_bytes());
        assert_eq!(data[63], 0xe8);
        assert_eq!(data[62], 0x03);
    }

    #[test]
    fn encode_string_head_tail() {
        // A 15-byte string after one static word: head offset = 0x40.
        let data = encode(
            &[AbiType::Uint, AbiType::String],
            &[
                AbiValue::Uint(7),
                AbiValue::String("Test Market One".to_string()),
            ],
        )
        .unwrap();
        // head(2 words) + length word + one padded payload word
        assert_eq!(data.len(), 128);
        assert_eq!(data[63], 0x40); // offset to tail
        assert_eq!(data[95], 15); // string length
        assert_eq!(&data[96..111], b"Test Market One");
        assert!(data[111..].iter().all(|b| *b == 0));
    }

    #[test]
    fn decode_mixed_values() {
        let types = [AbiType::Address, AbiType::String, AbiType::Bool];
        let values = vec![
            AbiValue::Address(addr()),
            AbiValue::String("gig".to_string()),
            AbiValue::Bool(true),
        ];
        let data = encode(&types, &values).unwrap();
        assert_eq!(decode(&types, &data).unwrap(), values);
    }

    #[test]
    fn arity_and_type_checks() {
        assert!(matches!(
            encode(&[AbiType::Uint], &[]),
            Err(CodecError::ArityMismatch { expected: 1, actual: 0 })
        ));
        assert!(matches!(
            encode(&[AbiType::Uint], &[AbiValue::Bool(true)]),
            Err(CodecError::TypeMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn decode_rejects_truncated_data() {
        assert!(matches!(
            decode(&[AbiType::Uint], &[0u8; 16]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn decode_rejects_uint_overflow() {
        let mut data = [0u8; 32];
        data[0] = 1;
        assert!(matches!(
            decode(&[AbiType::Uint], &data),
            Err(CodecError::UintOverflow)
        ));
    }

    #[test]
    fn decode_rejects_garbage_bool() {
        let mut data = [0u8; 32];
        data[31] = 2;
        assert!(matches!(
            decode(&[AbiType::Bool], &data),
            Err(CodecError::InvalidBool)
        ));
    }

    #[test]
    fn topic_rejects_string() {
        assert!(decode_topic(AbiType::String, &[0u8; 32]).is_err());
    }

    proptest! {
        #[test]
        fn uint_word_roundtrip(value in any::<u128>()) {
            let word = uint_word(value);
            prop_assert_eq!(decode_uint_word(&word).unwrap(), value);
        }

        #[test]
        fn string_roundtrip(s in "[a-zA-Z0-9 ]{0,80}") {
            let types = [AbiType::String];
            let values = vec![AbiValue::String(s)];
            let data = encode(&types, &values).unwrap();
            prop_assert_eq!(decode(&types, &data).unwrap(), values);
        }
    }
}
