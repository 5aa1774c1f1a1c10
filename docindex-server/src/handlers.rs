//! Request handlers.
//!
//! Each handler takes already-decoded arguments plus a reference to the
//! document root and the open store, and returns a finished reply frame.
//! None of these touch the network or the cache — that's the actor's job.

use std::path::Path;

use bytes::Bytes;

use docindex_core::protocol::{ResponseBuilder, STATUS_OK};
use docindex_core::schema::Opcode;
use docindex_core::store::{Document, DocumentStore};
use docindex_core::{scan, DocIndexError, Result};

/// What a handler produced. `Shutdown` carries the reply that must still
/// be sent before the connection (and, once it drains, the server) exits.
pub enum HandlerOutcome {
    Reply(Bytes),
    Shutdown(Bytes),
}

fn text_reply(opcode: Opcode, text: &str) -> Result<Bytes> {
    let mut b = ResponseBuilder::new(opcode.as_u8(), STATUS_OK);
    b.add_tlv(1, text.as_bytes())?;
    b.finish()
}

pub fn handle_add(
    store: &mut DocumentStore,
    title: &str,
    authors: &str,
    year: u32,
    path: &str,
) -> Result<Bytes> {
    let key = store.add(Document {
        key: -1,
        title: title.to_string(),
        authors: authors.to_string(),
        path: path.to_string(),
        year,
    })?;
    text_reply(Opcode::A, &format!("Document {key} indexed"))
}

pub fn handle_consult(store: &mut DocumentStore, key: i32) -> Result<Bytes> {
    match store.get(key) {
        Ok(doc) => {
            let mut b = ResponseBuilder::new(Opcode::C.as_u8(), STATUS_OK);
            b.add_tlv(1, format!("Title: {}", doc.title).as_bytes())?;
            b.add_tlv(1, format!("Authors: {}", doc.authors).as_bytes())?;
            b.add_tlv(1, format!("Year: {}", doc.year).as_bytes())?;
            b.add_tlv(1, format!("Path: {}", doc.path).as_bytes())?;
            b.finish()
        }
        Err(DocIndexError::NotFound) => text_reply(Opcode::C, "Document not found"),
        Err(e) => Err(e),
    }
}

pub fn handle_delete(store: &mut DocumentStore, key: i32) -> Result<Bytes> {
    match store.delete(key) {
        Ok(()) => text_reply(Opcode::D, &format!("Index entry {key} deleted")),
        Err(DocIndexError::NotFound) => text_reply(Opcode::D, &format!("Index entry {key} not found")),
        Err(e) => Err(e),
    }
}

pub fn handle_list(store: &mut DocumentStore, doc_root: &Path, key: i32, term: &str) -> Result<Bytes> {
    let doc = match store.get(key) {
        Ok(doc) => doc,
        Err(DocIndexError::NotFound) => return text_reply(Opcode::L, "Document not found"),
        Err(e) => return Err(e),
    };

    let full_path = doc_root.join(&doc.path);
    let count = scan::count_keyword(&full_path, term, false)?;

    let mut b = ResponseBuilder::new(Opcode::L.as_u8(), STATUS_OK);
    b.add_tlv(0, &(count as u32).to_le_bytes())?;
    b.finish()
}

/// Builds the `"[k1, k2, …]"` reply for a resolved hit bitmap. A capacity
/// overflow while appending keys is a protocol error rather than a
/// silently truncated list.
pub fn render_search_reply(hits: &[bool]) -> Result<Bytes> {
    let mut list = String::from("[");
    let mut first = true;
    for (key, hit) in hits.iter().enumerate() {
        if !hit {
            continue;
        }
        if !first {
            list.push_str(", ");
        }
        list.push_str(&key.to_string());
        first = false;
    }
    list.push(']');
    text_reply(Opcode::S, &list)
}

pub fn handle_flush() -> Bytes {
    text_reply(Opcode::F, "Server is shutting down")
        .expect("shutdown message always fits a single frame")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn add_reply_names_the_assigned_key() {
        let tmp = NamedTempFile::new().unwrap();
        let mut store = DocumentStore::open(tmp.path()).unwrap();
        let reply = handle_add(&mut store, "T", "A", 2020, "f.txt").unwrap();
        assert!(String::from_utf8_lossy(&reply).contains("Document 0 indexed"));
    }

    #[test]
    fn consult_missing_key_is_a_reply_not_an_error() {
        let tmp = NamedTempFile::new().unwrap();
        let mut store = DocumentStore::open(tmp.path()).unwrap();
        let reply = handle_consult(&mut store, 0).unwrap();
        assert!(String::from_utf8_lossy(&reply).contains("Document not found"));
    }

    #[test]
    fn delete_twice_reports_deleted_then_not_found() {
        let tmp = NamedTempFile::new().unwrap();
        let mut store = DocumentStore::open(tmp.path()).unwrap();
        store.add(Document { key: -1, title: "T".into(), authors: "A".into(), path: "f.txt".into(), year: 2020 }).unwrap();

        let first = handle_delete(&mut store, 0).unwrap();
        assert!(String::from_utf8_lossy(&first).contains("Index entry 0 deleted"));

        let second = handle_delete(&mut store, 0).unwrap();
        assert!(String::from_utf8_lossy(&second).contains("Index entry 0 not found"));
    }

    #[test]
    fn search_reply_renders_ascending_comma_separated_keys() {
        let reply = render_search_reply(&[true, false, true]).unwrap();
        assert_eq!(&reply[reply.len() - 6..], b"[0, 2]");
    }

    #[test]
    fn search_reply_for_no_hits_is_empty_brackets() {
        let reply = render_search_reply(&[false, false]).unwrap();
        assert_eq!(&reply[reply.len() - 2..], b"[]");
    }
}
