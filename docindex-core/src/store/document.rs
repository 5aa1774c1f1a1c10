//! Document record layout.

/// Maximum bytes a title occupies in a stored record, including the
/// trailing NUL.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum bytes an authors field occupies in a stored record, including
/// the trailing NUL.
pub const MAX_AUTHORS_LEN: usize = 200;
/// Maximum bytes a relative path occupies in a stored record, including
/// the trailing NUL.
pub const MAX_PATH_LEN: usize = 64;

/// Size in bytes of one fixed-size document row on disk:
/// `key:i32 + title[200] + authors[200] + path[64] + year:u32`.
pub const RECORD_SIZE: usize =
    4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN + MAX_PATH_LEN + 4;

/// Key value written into a deleted row's `key` field.
pub const TOMBSTONE_KEY: i32 = -1;

/// A document row as stored in the index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub key: i32,
    pub title: String,
    pub authors: String,
    pub path: String,
    pub year: u32,
}

impl Document {
    pub fn is_tombstone(&self) -> bool {
        self.key == TOMBSTONE_KEY
    }

    /// Serializes into exactly [`RECORD_SIZE`] bytes. Fields longer than
    /// their slot are silently truncated to `slot_len - 1` bytes (leaving
    /// room for the trailing NUL) rather than rejecting the request.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..4].copy_from_slice(&self.key.to_le_bytes());

        write_fixed_str(&mut buf[4..4 + MAX_TITLE_LEN], &self.title);
        write_fixed_str(
            &mut buf[4 + MAX_TITLE_LEN..4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN],
            &self.authors,
        );
        write_fixed_str(
            &mut buf[4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN
                ..4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN + MAX_PATH_LEN],
            &self.path,
        );

        let year_off = 4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN + MAX_PATH_LEN;
        buf[year_off..year_off + 4].copy_from_slice(&self.year.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Document {
        let key = i32::from_le_bytes(buf[0..4].try_into().unwrap());
        let title = read_fixed_str(&buf[4..4 + MAX_TITLE_LEN]);
        let authors = read_fixed_str(
            &buf[4 + MAX_TITLE_LEN..4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN],
        );
        let path = read_fixed_str(
            &buf[4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN
                ..4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN + MAX_PATH_LEN],
        );
        let year_off = 4 + MAX_TITLE_LEN + MAX_AUTHORS_LEN + MAX_PATH_LEN;
        let year = u32::from_le_bytes(buf[year_off..year_off + 4].try_into().unwrap());

        Document { key, title, authors, path, year }
    }

    /// A zeroed tombstone row.
    pub fn tombstone() -> Document {
        Document {
            key: TOMBSTONE_KEY,
            title: String::new(),
            authors: String::new(),
            path: String::new(),
            year: 0,
        }
    }
}

fn write_fixed_str(slot: &mut [u8], value: &str) {
    let cap = slot.len() - 1; // reserve the trailing NUL
    let bytes = value.as_bytes();
    let n = bytes.len().min(cap);
    slot[..n].copy_from_slice(&bytes[..n]);
}

fn read_fixed_str(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_normal_document() {
        let doc = Document {
            key: 3,
            title: "T".into(),
            authors: "A".into(),
            path: "f.txt".into(),
            year: 2020,
        };
        let bytes = doc.encode();
        assert_eq!(Document::decode(&bytes), doc);
    }

    #[test]
    fn truncates_oversize_fields_instead_of_erroring() {
        let long_title = "x".repeat(MAX_TITLE_LEN + 50);
        let doc = Document {
            key: 0,
            title: long_title.clone(),
            authors: String::new(),
            path: String::new(),
            year: 0,
        };
        let bytes = doc.encode();
        let back = Document::decode(&bytes);
        assert_eq!(back.title.len(), MAX_TITLE_LEN - 1);
        assert_eq!(back.title, &long_title[..MAX_TITLE_LEN - 1]);
    }

    #[test]
    fn tombstone_round_trips() {
        let bytes = Document::tombstone().encode();
        let back = Document::decode(&bytes);
        assert!(back.is_tombstone());
    }
}
