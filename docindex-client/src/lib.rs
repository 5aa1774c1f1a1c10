//! Command-line client library for docindexd.
//!
//! Encodes one schema-validated request, sends it over a Unix domain
//! socket, and renders the single reply frame the server sends back.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{ClientBuilder, DocIndexClient};
pub use error::{ClientError, Result};
