//! Frame builders.
//!
//! Each builder accumulates TLVs into a bounded payload buffer and stamps
//! a header once `finish` is called. Building is append-only and
//! non-restartable, mirroring the cursor's read-side contract.

use bytes::{BufMut, Bytes, BytesMut};

use super::header::{
    RequestHeader, ResponseHeader, MAX_FRAME, REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE,
    TLV_HEADER_SIZE,
};
use crate::error::{DocIndexError, Result};

fn push_tlv(payload: &mut BytesMut, cap: usize, ty: u8, value: &[u8]) -> Result<()> {
    if value.len() > u16::MAX as usize {
        return Err(DocIndexError::ValueTooLarge);
    }
    if payload.len() + TLV_HEADER_SIZE + value.len() > cap {
        return Err(DocIndexError::CapacityExceeded);
    }
    payload.put_u8(ty);
    payload.put_u16_le(value.len() as u16);
    payload.put_slice(value);
    Ok(())
}

/// Builds a single request frame for one opcode.
pub struct RequestBuilder {
    opcode: u8,
    pid: u32,
    cap: usize,
    payload: BytesMut,
}

impl RequestBuilder {
    /// Starts a new request builder. `cap` bounds the payload (not
    /// including the header) and defaults to the maximum a frame can hold.
    pub fn new(opcode: u8, pid: u32) -> Self {
        Self::with_capacity(opcode, pid, MAX_FRAME - REQUEST_HEADER_SIZE)
    }

    pub fn with_capacity(opcode: u8, pid: u32, cap: usize) -> Self {
        RequestBuilder {
            opcode,
            pid,
            cap,
            payload: BytesMut::new(),
        }
    }

    pub fn add_tlv(&mut self, ty: u8, value: &[u8]) -> Result<()> {
        push_tlv(&mut self.payload, self.cap, ty, value)
    }

    pub fn finish(self) -> Result<Bytes> {
        let total = REQUEST_HEADER_SIZE + self.payload.len();
        if total > u16::MAX as usize {
            return Err(DocIndexError::CapacityExceeded);
        }
        let header = RequestHeader {
            len: total as u16,
            opcode: self.opcode,
            pid: self.pid,
        };
        let mut out = BytesMut::with_capacity(total);
        header.encode(&mut out);
        out.put_slice(&self.payload);
        Ok(out.freeze())
    }
}

/// Builds a single response frame for one opcode.
pub struct ResponseBuilder {
    opcode: u8,
    status: u8,
    cap: usize,
    payload: BytesMut,
}

impl ResponseBuilder {
    pub fn new(opcode: u8, status: u8) -> Self {
        Self::with_capacity(opcode, status, MAX_FRAME - RESPONSE_HEADER_SIZE)
    }

    pub fn with_capacity(opcode: u8, status: u8, cap: usize) -> Self {
        ResponseBuilder {
            opcode,
            status,
            cap,
            payload: BytesMut::new(),
        }
    }

    pub fn add_tlv(&mut self, ty: u8, value: &[u8]) -> Result<()> {
        push_tlv(&mut self.payload, self.cap, ty, value)
    }

    pub fn finish(self) -> Result<Bytes> {
        let total = RESPONSE_HEADER_SIZE + self.payload.len();
        if total > u16::MAX as usize {
            return Err(DocIndexError::CapacityExceeded);
        }
        let header = ResponseHeader {
            len: total as u16,
            opcode: self.opcode,
            status: self.status,
        };
        let mut out = BytesMut::with_capacity(total);
        header.encode(&mut out);
        out.put_slice(&self.payload);
        Ok(out.freeze())
    }
}
