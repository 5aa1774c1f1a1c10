//! Per-connection request dispatch.
//!
//! Decodes a request frame against the command schema, routes it to the
//! server actor, and returns the reply frame the transport loop writes
//! back. A parse/arity/type failure drops the request outright (no
//! reply); a handler error for a non-blocking opcode is downgraded to a
//! synthetic `"ERR"` reply so the client is never left waiting.

use bytes::Bytes;

use docindex_core::protocol::{decode_u32, ArgType, ArgValue, Cursor, ResponseBuilder, TlvOutcome, STATUS_ERR};
use docindex_core::schema::{lookup_by_opcode, Opcode};
use docindex_core::Result as CoreResult;

use crate::actor::ServerHandle;

/// Outcome of dispatching one request frame.
pub enum DispatchOutcome {
    /// Send this frame back and keep serving the connection.
    Reply(Bytes),
    /// Send this frame back, then close the connection (opcode `F`).
    Shutdown(Bytes),
    /// The request was malformed or unrecognised; no reply is sent.
    Dropped,
}

pub async fn dispatch(handle: &ServerHandle, opcode_byte: u8, payload: &[u8]) -> DispatchOutcome {
    let Ok(opcode) = Opcode::try_from(opcode_byte) else {
        tracing::warn!(opcode = opcode_byte, "dropping request with unknown opcode");
        return DispatchOutcome::Dropped;
    };
    let Some(entry) = lookup_by_opcode(opcode) else {
        tracing::warn!(?opcode, "opcode has no schema entry");
        return DispatchOutcome::Dropped;
    };

    let Some(args) = decode_args(payload, entry.arg_types, entry.argc_min, entry.argc_max) else {
        tracing::warn!(?opcode, "dropping request: arity or type mismatch");
        return DispatchOutcome::Dropped;
    };

    tracing::debug!(?opcode, argc = args.len(), "dispatching request");

    match opcode {
        Opcode::A => {
            let title = args[0].as_str().unwrap_or_default().to_string();
            let authors = args[1].as_str().unwrap_or_default().to_string();
            let year = args[2].as_u32().unwrap_or_default();
            let path = args[3].as_str().unwrap_or_default().to_string();
            match handle.add(title, authors, year, path).await {
                Ok(reply) => DispatchOutcome::Reply(reply),
                Err(e) => {
                    tracing::error!(error = %e, "add handler failed; dropping request");
                    DispatchOutcome::Dropped
                }
            }
        }
        Opcode::C => {
            let key = args[0].as_u32().unwrap_or_default() as i32;
            reply_or_err(opcode, handle.consult(key).await)
        }
        Opcode::D => match handle.delete(args[0].as_u32().unwrap_or_default() as i32).await {
            Ok(reply) => DispatchOutcome::Reply(reply),
            Err(e) => {
                tracing::error!(error = %e, "delete handler failed; dropping request");
                DispatchOutcome::Dropped
            }
        },
        Opcode::L => {
            let key = args[0].as_u32().unwrap_or_default() as i32;
            let term = args[1].as_str().unwrap_or_default().to_string();
            reply_or_err(opcode, handle.list_count(key, term).await)
        }
        Opcode::S => {
            let term = args[0].as_str().unwrap_or_default().to_string();
            let workers = args.get(1).and_then(|a| a.as_u32()).unwrap_or(1) as usize;
            reply_or_err(opcode, handle.search(term, workers).await)
        }
        Opcode::F => DispatchOutcome::Shutdown(handle.flush().await),
    }
}

fn decode_args<'a>(
    payload: &'a [u8],
    arg_types: &[ArgType],
    argc_min: u8,
    argc_max: u8,
) -> Option<Vec<ArgValue<'a>>> {
    let mut cursor = Cursor::new(payload);
    let mut args = Vec::new();

    loop {
        match cursor.next() {
            TlvOutcome::More { ty, value } => {
                let expected = *arg_types.get(args.len()).or_else(|| arg_types.last())?;
                let arg = match expected {
                    ArgType::U32 => {
                        if ty != ArgType::U32 as u8 {
                            return None;
                        }
                        ArgValue::U32(decode_u32(value).ok()?)
                    }
                    ArgType::Str => {
                        if ty != ArgType::Str as u8 {
                            return None;
                        }
                        ArgValue::Str(value)
                    }
                };
                args.push(arg);
            }
            TlvOutcome::End => break,
            TlvOutcome::Corrupt => return None,
        }
    }

    let argc = args.len() as u8;
    if argc < argc_min || argc > argc_max {
        return None;
    }
    Some(args)
}

fn reply_or_err(opcode: Opcode, result: CoreResult<Bytes>) -> DispatchOutcome {
    match result {
        Ok(reply) => DispatchOutcome::Reply(reply),
        Err(e) => {
            tracing::error!(error = %e, ?opcode, "handler failed; synthesizing ERR reply");
            DispatchOutcome::Reply(synthesize_err(opcode))
        }
    }
}

fn synthesize_err(opcode: Opcode) -> Bytes {
    let mut b = ResponseBuilder::new(opcode.as_u8(), STATUS_ERR);
    let _ = b.add_tlv(1, b"ERR");
    b.finish().expect("a 3-byte TLV always fits an empty frame")
}
