//! Bounded response cache with on-disk persistence.
//!
//! Two implementations share the [`ResponseCache`] trait: [`LruCache`],
//! a real most-recently-used cache, and [`NoopCache`], which always
//! misses. Neither is internally synchronized — like the document
//! store, the cache is a dispatcher-private structure; only the task
//! that owns it touches it.

use std::collections::{HashMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::Result;

/// Maximum key length accepted from a persistence file; a longer value
/// is treated as a malformed record.
const MAX_PERSISTED_KEY_LEN: usize = 255;

/// A response cache keyed by search term.
pub trait ResponseCache: Send {
    /// Looks up `key`. On hit, marks it most-recently-used.
    fn get(&mut self, key: &str) -> Option<Bytes>;
    /// Inserts or overwrites `key`, marking it most-recently-used, then
    /// evicts from the least-recently-used end until `len() <= capacity`.
    /// A no-op when the cache's capacity is 0.
    fn put(&mut self, key: &str, frame: Bytes);
    /// Persists the current contents (if capacity > 0) and drops them.
    fn cleanup(&mut self) -> Result<()>;
}

/// Bounded LRU cache backed by a hash map plus an explicit recency
/// queue (front = most recently used).
pub struct LruCache {
    capacity: usize,
    persistence_path: PathBuf,
    entries: HashMap<String, Bytes>,
    order: VecDeque<String>,
}

impl LruCache {
    /// Creates a cache of the given capacity, loading any existing
    /// persistence file at `persistence_path`. A missing file is not an
    /// error; a malformed record stops loading early rather than
    /// failing.
    pub fn init(capacity: usize, persistence_path: impl Into<PathBuf>) -> Result<Self> {
        let persistence_path = persistence_path.into();
        let mut cache = LruCache {
            capacity,
            persistence_path,
            entries: HashMap::new(),
            order: VecDeque::new(),
        };
        if capacity > 0 {
            cache.load_from_disk();
        }
        Ok(cache)
    }

    fn load_from_disk(&mut self) {
        let mut file = match File::open(&self.persistence_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(error = %e, "failed to open cache persistence file");
                return;
            }
        };

        let count = match read_u32(&mut file) {
            Some(n) => n,
            None => return,
        };

        for _ in 0..count {
            if self.entries.len() >= self.capacity {
                break;
            }
            let Some(klen) = read_u16(&mut file) else { break };
            if klen == 0 || klen as usize > MAX_PERSISTED_KEY_LEN {
                tracing::warn!(klen, "malformed cache entry: bad key length, stopping load");
                break;
            }
            let mut key_bytes = vec![0u8; klen as usize];
            if file.read_exact(&mut key_bytes).is_err() {
                break;
            }
            let Ok(key) = String::from_utf8(key_bytes) else { break };

            let Some(rlen) = read_u16(&mut file) else { break };
            if rlen as usize > crate::protocol::MAX_FRAME {
                tracing::warn!(rlen, "malformed cache entry: response too large, stopping load");
                break;
            }
            let mut frame_bytes = vec![0u8; rlen as usize];
            if file.read_exact(&mut frame_bytes).is_err() {
                break;
            }

            // Records are written MRU-first (see `dump_to_disk`); pushing
            // each subsequent record to the back preserves that order.
            self.order.push_back(key.clone());
            self.entries.insert(key, Bytes::from(frame_bytes));
        }
    }

    fn dump_to_disk(&self) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.persistence_path)?;

        file.write_all(&(self.order.len() as u32).to_le_bytes())?;
        for key in &self.order {
            let frame = &self.entries[key];
            file.write_all(&(key.len() as u16).to_le_bytes())?;
            file.write_all(key.as_bytes())?;
            file.write_all(&(frame.len() as u16).to_le_bytes())?;
            file.write_all(frame)?;
        }
        Ok(())
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos).unwrap();
            self.order.push_front(k);
        }
    }

    fn evict_to_capacity(&mut self) {
        while self.order.len() > self.capacity {
            if let Some(lru) = self.order.pop_back() {
                self.entries.remove(&lru);
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResponseCache for LruCache {
    fn get(&mut self, key: &str) -> Option<Bytes> {
        let frame = self.entries.get(key).cloned();
        if frame.is_some() {
            self.touch(key);
        }
        frame
    }

    fn put(&mut self, key: &str, frame: Bytes) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.contains_key(key) {
            self.entries.insert(key.to_string(), frame);
            self.touch(key);
            return;
        }
        self.entries.insert(key.to_string(), frame);
        self.order.push_front(key.to_string());
        self.evict_to_capacity();
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.capacity > 0 {
            self.dump_to_disk()?;
        }
        self.entries.clear();
        self.order.clear();
        Ok(())
    }
}

/// A cache that never stores anything — an alternate backend for when
/// search results shouldn't be cached at all.
#[derive(Default)]
pub struct NoopCache;

impl ResponseCache for NoopCache {
    fn get(&mut self, _key: &str) -> Option<Bytes> {
        None
    }

    fn put(&mut self, _key: &str, _frame: Bytes) {}

    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
}

fn read_u32(file: &mut File) -> Option<u32> {
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf).ok()?;
    Some(u32::from_le_bytes(buf))
}

fn read_u16(file: &mut File) -> Option<u16> {
    let mut buf = [0u8; 2];
    file.read_exact(&mut buf).ok()?;
    Some(u16::from_le_bytes(buf))
}

/// Convenience constructor choosing [`LruCache`] or [`NoopCache`] based
/// on capacity and a no-op override, matching the server's
/// `--no-cache`-style configuration knob.
pub fn build_cache(
    capacity: usize,
    persistence_path: impl AsRef<Path>,
    force_noop: bool,
) -> Result<Box<dyn ResponseCache>> {
    if force_noop || capacity == 0 {
        return Ok(Box::new(NoopCache));
    }
    Ok(Box::new(LruCache::init(capacity, persistence_path.as_ref().to_path_buf())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn recency_order_and_eviction() {
        let dir = tempdir().unwrap();
        let mut cache = LruCache::init(2, dir.path().join("cache.bin")).unwrap();

        cache.put("a", Bytes::from_static(b"A"));
        cache.put("b", Bytes::from_static(b"B"));
        assert!(cache.get("a").is_some()); // a is now MRU
        cache.put("c", Bytes::from_static(b"C")); // evicts b (LRU)

        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a").unwrap(), Bytes::from_static(b"A"));
        assert_eq!(cache.get("c").unwrap(), Bytes::from_static(b"C"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn persists_and_reloads_with_value_intact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.bin");

        let mut cache = LruCache::init(8, &path).unwrap();
        cache.put("term", Bytes::from_static(b"frame-bytes"));
        cache.cleanup().unwrap();

        let mut reloaded = LruCache::init(8, &path).unwrap();
        assert_eq!(reloaded.get("term").unwrap(), Bytes::from_static(b"frame-bytes"));
    }

    #[test]
    fn zero_capacity_put_is_a_no_op() {
        let dir = tempdir().unwrap();
        let mut cache = LruCache::init(0, dir.path().join("cache.bin")).unwrap();
        cache.put("x", Bytes::from_static(b"y"));
        assert!(cache.get("x").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn noop_cache_always_misses() {
        let mut cache = NoopCache;
        cache.put("x", Bytes::from_static(b"y"));
        assert!(cache.get("x").is_none());
    }
}
