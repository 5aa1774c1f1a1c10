//! # docindex-core
//!
//! Wire protocol, document store, keyword scan engine and response cache
//! for the docindex document indexing service.
//!
//! ## Layout
//!
//! - [`protocol`]: the TLV wire codec — headers, builder, cursor, scalar
//!   argument encoders/decoders.
//! - [`schema`]: the command table shared by client and server.
//! - [`store`]: the fixed-record document index file.
//! - [`scan`]: the byte-streaming keyword matcher and its parallel
//!   fan-out across worker threads.
//! - [`cache`]: the bounded LRU response cache and its no-op
//!   alternative.
//! - [`error`]: the error type shared across all of the above.
//!
//! ## Quick start
//!
//! ```
//! use docindex_core::protocol::{RequestBuilder, header};
//! use docindex_core::schema::{parse_cli, Opcode};
//!
//! let args: Vec<String> = vec!["-c".into(), "0".into()];
//! let entry = parse_cli(&args).unwrap();
//! assert_eq!(entry.opcode, Opcode::C);
//!
//! let mut b = RequestBuilder::new(entry.opcode.as_u8(), std::process::id());
//! b.add_tlv(0, &0u32.to_le_bytes()).unwrap();
//! let frame = b.finish().unwrap();
//! assert!(frame.len() >= header::REQUEST_HEADER_SIZE);
//! ```

pub mod cache;
pub mod error;
pub mod protocol;
pub mod scan;
pub mod schema;
pub mod store;

pub use cache::{build_cache, LruCache, NoopCache, ResponseCache};
pub use error::{DocIndexError, Result};
pub use schema::{lookup_by_opcode, parse_cli, CommandEntry, Opcode, COMMAND_TABLE};
pub use store::{Document, DocumentStore};
