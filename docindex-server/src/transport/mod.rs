//! Transport layer for the document indexing server.
//!
//! A single Unix domain socket transport: every accepted connection is a
//! private, full-duplex byte stream carrying the same wire frames.

pub mod native;

pub use native::serve;
