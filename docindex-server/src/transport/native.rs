//! Unix domain socket transport.
//!
//! ## Wire format
//!
//! Requests and responses share the TLV payload encoding but differ in
//! header layout:
//!
//! ```text
//! request:  ┌────────┬────────┬────────┐
//!           │ len:u16│opcode:u8│ pid:u32│  (7 bytes, then payload)
//!           └────────┴────────┴────────┘
//! response: ┌────────┬────────┬────────┐
//!           │ len:u16│opcode:u8│status:u8│ (4 bytes, then payload)
//!           └────────┴────────┴────────┘
//! ```
//!
//! The header's length field is the sole framing authority; nothing is
//! inferred from how the transport delivered the bytes.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

use docindex_core::protocol::header::REQUEST_HEADER_SIZE;
use docindex_core::protocol::RequestHeader;

use crate::actor::ServerHandle;
use crate::dispatcher::{self, DispatchOutcome};

/// Binds the listener, removing a stale socket file left by an unclean
/// previous shutdown, then accepts connections until the actor signals
/// shutdown. Removes the socket file again on the way out.
pub async fn serve(socket_path: &Path, handle: ServerHandle) -> Result<()> {
    if socket_path.exists() {
        std::fs::remove_file(socket_path)
            .with_context(|| format!("removing stale socket at {socket_path:?}"))?;
    }
    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("binding unix socket at {socket_path:?}"))?;
    tracing::info!(path = %socket_path.display(), "listening on unix domain socket");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _addr) = accepted.context("accepting connection")?;
                let handle = handle.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, handle).await {
                        tracing::error!(error = %e, "connection ended with an error");
                    }
                });
            }
            _ = handle.shutdown.notified() => {
                tracing::info!("shutdown signalled, no longer accepting connections");
                break;
            }
        }
    }

    let _ = std::fs::remove_file(socket_path);
    Ok(())
}

async fn handle_connection(mut stream: UnixStream, handle: ServerHandle) -> Result<()> {
    tracing::info!("connection accepted");

    loop {
        let Some((opcode, payload)) = read_request(&mut stream).await? else {
            break;
        };

        match dispatcher::dispatch(&handle, opcode, &payload).await {
            DispatchOutcome::Reply(frame) => {
                write_frame(&mut stream, &frame).await?;
            }
            DispatchOutcome::Shutdown(frame) => {
                write_frame(&mut stream, &frame).await?;
                break;
            }
            DispatchOutcome::Dropped => {}
        }
    }

    tracing::info!("connection closed");
    Ok(())
}

/// Reads one whole request frame. Returns `None` on a clean EOF between
/// requests (the client closed its end).
async fn read_request(stream: &mut UnixStream) -> Result<Option<(u8, Vec<u8>)>> {
    let mut header_buf = [0u8; REQUEST_HEADER_SIZE];
    match stream.read_exact(&mut header_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("reading request header"),
    }

    let mut cursor: &[u8] = &header_buf;
    let header = RequestHeader::decode(&mut cursor).context("decoding request header")?;

    let total = header.len as usize;
    if total < REQUEST_HEADER_SIZE {
        anyhow::bail!("request header declares a length shorter than the header itself");
    }

    let mut payload = vec![0u8; total - REQUEST_HEADER_SIZE];
    stream
        .read_exact(&mut payload)
        .await
        .context("reading request payload")?;

    Ok(Some((header.opcode, payload)))
}

async fn write_frame(stream: &mut UnixStream, frame: &[u8]) -> Result<()> {
    stream.write_all(frame).await.context("writing reply frame")?;
    stream.flush().await.context("flushing reply frame")?;
    Ok(())
}
