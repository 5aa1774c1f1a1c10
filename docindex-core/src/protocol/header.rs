//! Request/response header layout.
//!
//! Both headers are little-endian and packed: no padding exists between
//! fields on the wire, matching a C struct declared
//! `__attribute__((packed))`.

use bytes::{Buf, BufMut};

use crate::error::{DocIndexError, Result};

/// Maximum size of a single frame (header + payload), in bytes.
pub const MAX_FRAME: usize = 65535;

/// `u8` type tag + `u16` length that precedes every TLV value.
pub const TLV_HEADER_SIZE: usize = 3;

/// Size of a request header on the wire: `u16 len + u8 opcode + u32 pid`.
pub const REQUEST_HEADER_SIZE: usize = 7;

/// Size of a response header on the wire: `u16 len + u8 opcode + u8 status`.
pub const RESPONSE_HEADER_SIZE: usize = 4;

/// Status byte meaning the request was handled normally.
pub const STATUS_OK: u8 = 0;
/// Status byte meaning the handler could not produce a normal reply and a
/// synthetic `"ERR"` frame was substituted.
pub const STATUS_ERR: u8 = 1;

/// Decoded request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    /// Total frame length (header + payload), as it appears on the wire.
    pub len: u16,
    pub opcode: u8,
    /// Client process identifier, carried for wire fidelity and logging;
    /// no longer used for reply routing.
    pub pid: u32,
}

impl RequestHeader {
    pub fn encode(&self, out: &mut impl BufMut) {
        out.put_u16_le(self.len);
        out.put_u8(self.opcode);
        out.put_u32_le(self.pid);
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < REQUEST_HEADER_SIZE {
            return Err(DocIndexError::CorruptFrame);
        }
        let len = buf.get_u16_le();
        let opcode = buf.get_u8();
        let pid = buf.get_u32_le();
        Ok(RequestHeader { len, opcode, pid })
    }
}

/// Decoded response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub len: u16,
    pub opcode: u8,
    pub status: u8,
}

impl ResponseHeader {
    pub fn encode(&self, out: &mut impl BufMut) {
        out.put_u16_le(self.len);
        out.put_u8(self.opcode);
        out.put_u8(self.status);
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < RESPONSE_HEADER_SIZE {
            return Err(DocIndexError::CorruptFrame);
        }
        let len = buf.get_u16_le();
        let opcode = buf.get_u8();
        let status = buf.get_u8();
        Ok(ResponseHeader { len, opcode, status })
    }
}
