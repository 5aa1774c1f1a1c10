//! docindex — command-line client for docindexd.
//!
//! ```bash
//! docindex -a "Title" "Author" 2020 "path/to/file.txt"
//! docindex --socket-path /tmp/docindex.sock -c 0
//! docindex -s "needle" 4
//! ```
//!
//! The command flag and its arguments always come from argv, matching
//! the schema table exactly; `--socket-path` and `--timeout-ms` are
//! ambient client knobs consumed before the command flag is looked up.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use docindex_client::ClientBuilder;
use docindex_core::protocol::STATUS_OK;
use docindex_core::schema::parse_cli;

const DEFAULT_SOCKET_PATH: &str = "/tmp/docindex.sock";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut socket_path = std::env::var("DOCINDEX_SOCKET_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOCKET_PATH));
    let mut read_timeout = Duration::from_millis(DEFAULT_TIMEOUT_MS);

    loop {
        match args.first().map(String::as_str) {
            Some("--socket-path") => {
                args.remove(0);
                let path = if args.is_empty() {
                    bail!("--socket-path needs a value");
                } else {
                    args.remove(0)
                };
                socket_path = PathBuf::from(path);
            }
            Some("--timeout-ms") => {
                args.remove(0);
                if args.is_empty() {
                    bail!("--timeout-ms needs a value");
                }
                let ms: u64 = args.remove(0).parse().context("--timeout-ms must be a number")?;
                read_timeout = Duration::from_millis(ms);
            }
            _ => break,
        }
    }

    let Some(entry) = parse_cli(&args) else {
        bail!(
            "usage: docindex [--socket-path PATH] [--timeout-ms N] \
             <-a TITLE AUTHORS YEAR PATH | -c KEY | -d KEY | -l KEY TERM | -s TERM [WORKERS] | -f>"
        );
    };
    let command_args = args[1..].to_vec();

    let mut client = ClientBuilder::new(socket_path)
        .read_timeout(read_timeout)
        .connect()
        .await
        .context("connecting to docindexd")?;

    let (status, lines) = client.call(entry, &command_args).await?;
    for line in &lines {
        println!("{line}");
    }

    if status != STATUS_OK {
        std::process::exit(1);
    }
    Ok(())
}
