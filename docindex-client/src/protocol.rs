//! Request encoding and response decoding for the CLI client.
//!
//! Builds a request frame from a parsed command-line invocation using the
//! same command schema the server validates against, then reads back
//! exactly one response frame and renders its payload for display.

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use docindex_core::protocol::header::RESPONSE_HEADER_SIZE;
use docindex_core::protocol::{encode_u32, ArgType, Cursor, RequestBuilder, ResponseHeader, STATUS_OK};
use docindex_core::schema::CommandEntry;
use docindex_core::DocIndexError;

use crate::error::{ClientError, Result};

/// Encodes `args` (the command's arguments, without the leading flag)
/// against `entry`'s argument-type vector into a request frame. A
/// trailing argument beyond `arg_types`'s length reuses the vector's last
/// entry, matching the server's own decoding rule for `-s`'s optional
/// worker count.
pub fn build_request(entry: &CommandEntry, args: &[String], pid: u32) -> Result<Bytes> {
    let mut b = RequestBuilder::new(entry.opcode.as_u8(), pid);
    for (i, raw) in args.iter().enumerate() {
        let ty = *entry
            .arg_types
            .get(i)
            .or_else(|| entry.arg_types.last())
            .ok_or_else(|| ClientError::Usage(format!("unexpected argument {raw:?}")))?;
        match ty {
            ArgType::U32 => {
                let wire = encode_u32(raw)
                    .map_err(|_| ClientError::Usage(format!("{raw:?} is not a valid number")))?;
                b.add_tlv(ArgType::U32 as u8, &wire)?;
            }
            ArgType::Str => {
                b.add_tlv(ArgType::Str as u8, raw.as_bytes())?;
            }
        }
    }
    Ok(b.finish()?)
}

/// Sends `request` and waits up to `read_timeout` for one whole response
/// frame, returning its status byte and payload (header stripped).
pub async fn send_request(
    stream: &mut UnixStream,
    request: &[u8],
    read_timeout: Duration,
) -> Result<(u8, Vec<u8>)> {
    stream.write_all(request).await.map_err(DocIndexError::from)?;
    stream.flush().await.map_err(DocIndexError::from)?;

    let mut header_buf = [0u8; RESPONSE_HEADER_SIZE];
    timeout(read_timeout, stream.read_exact(&mut header_buf))
        .await
        .map_err(|_| ClientError::Timeout)?
        .map_err(|e| DocIndexError::TransportError(e.to_string()))?;

    let mut cursor: &[u8] = &header_buf;
    let header = ResponseHeader::decode(&mut cursor)?;

    let total = header.len as usize;
    if total < RESPONSE_HEADER_SIZE {
        return Err(DocIndexError::CorruptFrame.into());
    }
    let mut payload = vec![0u8; total - RESPONSE_HEADER_SIZE];
    timeout(read_timeout, stream.read_exact(&mut payload))
        .await
        .map_err(|_| ClientError::Timeout)?
        .map_err(|e| DocIndexError::TransportError(e.to_string()))?;

    if header.status != STATUS_OK {
        tracing::warn!(opcode = header.opcode, "server returned a non-OK status");
    }
    Ok((header.status, payload))
}

/// Renders a response payload as the lines a human invoking the CLI
/// should see: every string TLV on its own line, `u32` TLVs as bare
/// decimal numbers.
pub fn render_reply(payload: &[u8]) -> Result<Vec<String>> {
    let tlvs = Cursor::new(payload)
        .collect_all()
        .map_err(|_| DocIndexError::CorruptFrame)?;

    let mut lines = Vec::with_capacity(tlvs.len());
    for (ty, value) in tlvs {
        let ty = ArgType::try_from(ty).map_err(|_| DocIndexError::TypeMismatch)?;
        match ty {
            ArgType::Str => lines.push(String::from_utf8_lossy(value).into_owned()),
            ArgType::U32 => lines.push(docindex_core::protocol::decode_u32(value)?.to_string()),
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docindex_core::schema::lookup_by_opcode;
    use docindex_core::schema::Opcode;

    #[test]
    fn build_request_encodes_add_arguments_in_order() {
        let entry = lookup_by_opcode(Opcode::A).unwrap();
        let args = vec!["T".to_string(), "A".to_string(), "2020".to_string(), "f.txt".to_string()];
        let frame = build_request(entry, &args, 1).unwrap();
        assert_eq!(frame[2], Opcode::A.as_u8());
    }

    #[test]
    fn build_request_rejects_a_non_numeric_year() {
        let entry = lookup_by_opcode(Opcode::A).unwrap();
        let args = vec!["T".to_string(), "A".to_string(), "not-a-year".to_string(), "f.txt".to_string()];
        assert!(build_request(entry, &args, 1).is_err());
    }

    #[test]
    fn build_request_reuses_last_arg_type_for_searchs_optional_worker_count() {
        let entry = lookup_by_opcode(Opcode::S).unwrap();
        let args = vec!["term".to_string(), "4".to_string()];
        assert!(build_request(entry, &args, 1).is_ok());
    }

    #[test]
    fn render_reply_turns_a_single_string_tlv_into_one_line() {
        let mut b = RequestBuilder::new(0, 0);
        b.add_tlv(1, b"Document not found").unwrap();
        let frame = b.finish().unwrap();
        let payload = &frame[docindex_core::protocol::header::REQUEST_HEADER_SIZE..];
        let lines = render_reply(payload).unwrap();
        assert_eq!(lines, vec!["Document not found".to_string()]);
    }
}
