//! Binary TLV wire protocol.
//!
//! Frames are little-endian and packed: a fixed header followed by
//! back-to-back TLVs. Requests and responses share the TLV encoding but
//! have different header layouts — see [`header`].
//!
//! ```
//! use docindex_core::protocol::{RequestBuilder, Cursor, TlvOutcome, header};
//!
//! let mut b = RequestBuilder::new(4, 1234); // opcode S
//! b.add_tlv(1, b"banana").unwrap();
//! let frame = b.finish().unwrap();
//!
//! let payload = &frame[header::REQUEST_HEADER_SIZE..];
//! let mut cursor = Cursor::new(payload);
//! assert_eq!(cursor.next(), TlvOutcome::More { ty: 1, value: b"banana" });
//! assert_eq!(cursor.next(), TlvOutcome::End);
//! ```

pub mod args;
pub mod builder;
pub mod cursor;
pub mod header;

pub use args::{decode_str, decode_u32, encode_str, encode_u32, ArgType, ArgValue};
pub use builder::{RequestBuilder, ResponseBuilder};
pub use cursor::{Cursor, TlvOutcome};
pub use header::{RequestHeader, ResponseHeader, MAX_FRAME, STATUS_ERR, STATUS_OK};
