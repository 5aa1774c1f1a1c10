//! docindexd — document indexing and keyword search server.
//!
//! Serves the document store, keyword scan engine and response cache
//! behind a Unix domain socket, using a single actor task to serialize
//! access to the mutable state.
//!
//! Exposed as a library so integration tests can drive the dispatcher
//! and actor directly, in addition to the `docindexd` binary.

pub mod actor;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod transport;
