//! docindexd — document indexing and keyword search server
//!
//! Serves the six document-store/search operations over a Unix domain
//! socket. Configuration comes from two positional CLI arguments (a
//! document folder and a cache size) plus the ambient knobs in
//! [`config::Config`].
//!
//! ```bash
//! docindexd /var/lib/docindex 256
//! docindexd --socket-path /tmp/docindex.sock --no-cache /var/lib/docindex 0
//! ```

mod actor;
mod config;
mod dispatcher;
mod handlers;
mod transport;

use anyhow::Result;

use config::Config;
use docindex_core::{build_cache, DocumentStore};

/// Mailbox capacity for the server actor; bounds how many in-flight
/// connection requests can be queued waiting for their turn.
const ACTOR_BUFFER_SIZE: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env_and_args()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("docindex_server={}", config.log_level).parse()?),
        )
        .init();

    let store = DocumentStore::open(config.index_path())?;
    let cache = build_cache(config.cache_size, config.cache_path(), config.no_cache)?;

    tracing::info!(
        docroot = %config.document_folder.display(),
        cache_size = config.cache_size,
        no_cache = config.no_cache,
        "starting docindexd"
    );

    let handle = actor::spawn(config.document_folder.clone(), store, cache, ACTOR_BUFFER_SIZE);

    transport::serve(&config.socket_path, handle).await?;

    tracing::info!("docindexd exiting");
    Ok(())
}
