//! Scalar argument codecs.
//!
//! These sit one layer above the raw TLV cursor/builder: they know how to
//! turn a decimal string (as typed on a CLI) into wire bytes, and how to
//! turn wire bytes back into a typed value a handler can use.

use crate::error::{DocIndexError, Result};

/// Wire type tag for a TLV value (`ARG_U32 = 0`, `ARG_STR = 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArgType {
    U32 = 0,
    Str = 1,
}

impl TryFrom<u8> for ArgType {
    type Error = DocIndexError;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(ArgType::U32),
            1 => Ok(ArgType::Str),
            _ => Err(DocIndexError::TypeMismatch),
        }
    }
}

/// A decoded argument value, borrowing string bytes from the frame that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue<'a> {
    U32(u32),
    Str(&'a [u8]),
}

impl<'a> ArgValue<'a> {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ArgValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            ArgValue::Str(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn arg_type(&self) -> ArgType {
        match self {
            ArgValue::U32(_) => ArgType::U32,
            ArgValue::Str(_) => ArgType::Str,
        }
    }
}

/// Parses a decimal string into 4 little-endian wire bytes. Rejects an
/// empty string, trailing non-digit characters, and values beyond
/// `u32::MAX`.
pub fn encode_u32(raw: &str) -> Result<[u8; 4]> {
    if raw.is_empty() {
        return Err(DocIndexError::TypeMismatch);
    }
    let value: u64 = raw.parse().map_err(|_| DocIndexError::TypeMismatch)?;
    if value > u32::MAX as u64 {
        return Err(DocIndexError::TypeMismatch);
    }
    Ok((value as u32).to_le_bytes())
}

/// Decodes 4 little-endian wire bytes into a `u32`. The wire length must
/// be exactly 4.
pub fn decode_u32(wire: &[u8]) -> Result<u32> {
    let bytes: [u8; 4] = wire.try_into().map_err(|_| DocIndexError::TypeMismatch)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Validates a string argument for the wire (verbatim bytes, no
/// terminator); rejects a value longer than 65535 bytes.
pub fn encode_str(raw: &str) -> Result<&[u8]> {
    let bytes = raw.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(DocIndexError::ValueTooLarge);
    }
    Ok(bytes)
}

/// Borrows a string argument straight out of the wire payload; no copy,
/// no null terminator.
pub fn decode_str(wire: &[u8]) -> Result<&str> {
    std::str::from_utf8(wire).map_err(|_| DocIndexError::TypeMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_round_trips_full_range_samples() {
        for x in [0u32, 1, 42, u32::MAX / 2, u32::MAX] {
            let wire = (x).to_le_bytes();
            assert_eq!(decode_u32(&wire).unwrap(), x);
        }
    }

    #[test]
    fn u32_encode_rejects_garbage() {
        assert!(encode_u32("").is_err());
        assert!(encode_u32("12a").is_err());
        assert!(encode_u32("4294967296").is_err());
        assert!(encode_u32("-1").is_err());
    }

    #[test]
    fn u32_decode_rejects_wrong_length() {
        assert!(decode_u32(&[1, 2, 3]).is_err());
        assert!(decode_u32(&[1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn str_encode_rejects_oversize() {
        let long = "x".repeat(u16::MAX as usize + 1);
        assert!(encode_str(&long).is_err());
    }
}
