//! One-shot Unix-domain-socket client.
//!
//! Each CLI invocation opens exactly one connection, sends one request,
//! waits for its reply, then disconnects — there is no connection pool
//! to manage across invocations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UnixStream;

use docindex_core::schema::CommandEntry;
use docindex_core::DocIndexError;

use crate::error::Result;
use crate::protocol;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ClientBuilder {
    socket_path: PathBuf,
    read_timeout: Duration,
}

impl ClientBuilder {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub async fn connect(self) -> Result<DocIndexClient> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            DocIndexError::TransportError(format!(
                "connecting to {}: {e}",
                self.socket_path.display()
            ))
        })?;
        Ok(DocIndexClient {
            stream,
            read_timeout: self.read_timeout,
        })
    }
}

/// A connected client, good for exactly as many requests as the server
/// keeps the connection open for.
pub struct DocIndexClient {
    stream: UnixStream,
    read_timeout: Duration,
}

impl DocIndexClient {
    pub async fn connect(socket_path: impl AsRef<Path>) -> Result<Self> {
        ClientBuilder::new(socket_path.as_ref().to_path_buf())
            .connect()
            .await
    }

    /// Sends one request for `entry` and returns the server's status byte
    /// alongside the rendered reply lines.
    pub async fn call(&mut self, entry: &CommandEntry, args: &[String]) -> Result<(u8, Vec<String>)> {
        let request = protocol::build_request(entry, args, std::process::id())?;
        let (status, payload) =
            protocol::send_request(&mut self.stream, &request, self.read_timeout).await?;
        let lines = protocol::render_reply(&payload)?;
        Ok((status, lines))
    }
}
