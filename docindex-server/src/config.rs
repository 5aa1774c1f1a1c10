//! Server configuration and CLI argument parsing.
//!
//! The command line takes two positional arguments: a document folder
//! and a cache size. Everything else (socket path, an opt-out of the
//! cache entirely) is ambient configuration layered on top, each
//! overridable by a `DOCINDEX_`-prefixed environment variable.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Document indexing and keyword search server.
#[derive(Parser, Debug)]
#[command(
    name = "docindexd",
    about = "Document indexing and keyword search server",
    long_about = "Serves document-store and keyword-search requests over a \
Unix domain socket. Environment variables with a DOCINDEX_ prefix override \
the corresponding CLI argument."
)]
struct Args {
    /// Directory containing indexed document files and the index/cache
    /// state files.
    #[arg(value_name = "DOCUMENT_FOLDER", env = "DOCINDEX_DOCUMENT_FOLDER")]
    document_folder: PathBuf,

    /// Maximum number of search responses to keep in the LRU cache.
    #[arg(value_name = "CACHE_SIZE", env = "DOCINDEX_CACHE_SIZE")]
    cache_size: usize,

    /// Unix domain socket path to listen on.
    #[arg(
        long,
        value_name = "PATH",
        default_value = "/tmp/docindex.sock",
        env = "DOCINDEX_SOCKET_PATH"
    )]
    socket_path: PathBuf,

    /// Disable the response cache entirely, regardless of `cache_size`.
    #[arg(long, env = "DOCINDEX_NO_CACHE")]
    no_cache: bool,

    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", env = "DOCINDEX_LOG_LEVEL")]
    log_level: String,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub document_folder: PathBuf,
    pub cache_size: usize,
    pub socket_path: PathBuf,
    pub no_cache: bool,
    pub log_level: String,
}

impl Config {
    /// Parses CLI arguments (with environment variable fallbacks) into a
    /// resolved configuration.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        let config = Config {
            document_folder: args.document_folder,
            cache_size: args.cache_size,
            socket_path: args.socket_path,
            no_cache: args.no_cache,
            log_level: args.log_level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Path of the on-disk document index file.
    pub fn index_path(&self) -> PathBuf {
        self.document_folder.join("index.bin")
    }

    /// Path of the on-disk cache persistence file.
    pub fn cache_path(&self) -> PathBuf {
        self.document_folder.join("cache_lru.bin")
    }

    fn validate(&self) -> Result<()> {
        if !self.document_folder.is_dir() {
            anyhow::bail!(
                "document folder {:?} does not exist or is not a directory",
                self.document_folder
            );
        }
        Ok(())
    }
}
