//! Keyword scan engine.
//!
//! Two independent pieces: a byte-streaming substring matcher over a
//! single document, and a parallel fan-out that runs that matcher across
//! many documents at once using worker threads, with an atomic counter
//! and an atomic bitmap standing in for shared process memory.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::Result;

const CHUNK_SIZE: usize = 8192;

/// Upper bound on worker threads per available CPU. The source hardcodes
/// this as `10`; kept here as a single named constant per the Design
/// Notes' "document it or parameterise" resolution.
pub const MAX_WORKERS_PER_CPU: usize = 10;

/// Computes `W = max(1, min(requested, 10 * ncpus, total))`.
pub fn worker_count(requested: usize, total: usize, ncpus: usize) -> usize {
    let cap = ncpus.max(1).saturating_mul(MAX_WORKERS_PER_CPU);
    requested.min(cap).min(total).max(1)
}

/// Streams `path` in 8 KiB chunks through a byte-by-byte substring state
/// machine, counting how many lines contain `term`. Pass
/// `stop_at_first = true` to return as soon as one match is found
/// (callers get `1` rather than an exact count).
///
/// An empty `term` never matches: the count is always 0.
pub fn count_keyword(path: impl AsRef<Path>, term: &str, stop_at_first: bool) -> Result<usize> {
    let term = term.as_bytes();
    if term.is_empty() {
        return Ok(0);
    }

    let mut file = File::open(path)?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut count = 0usize;
    let mut matched = 0usize; // how many prefix bytes of `term` matched so far
    let mut matched_line = false;

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        for &c in &buf[..n] {
            if c == term[matched] {
                matched += 1;
                if matched == term.len() {
                    matched_line = true;
                    matched = 0;
                    if stop_at_first {
                        return Ok(1);
                    }
                }
            } else {
                matched = if c == term[0] { 1 } else { 0 };
            }

            if c == b'\n' {
                if matched_line {
                    count += 1;
                }
                matched_line = false;
            }
        }
    }

    if matched_line {
        count += 1; // final line had no trailing newline
    }

    Ok(count)
}

/// Whether `path` contains `term` at all.
pub fn contains_keyword(path: impl AsRef<Path>, term: &str) -> Result<bool> {
    Ok(count_keyword(path, term, true)? > 0)
}

/// Fans a keyword search out across `snapshot`, a read-only, pre-resolved
/// mapping from document key to file path (`None` for a key with no
/// scannable file, e.g. a tombstoned slot). Returns a `bool` per key in
/// `[0, snapshot.len())` — `true` if that document contains `term`.
///
/// A per-document I/O error (permission denied, file removed under us)
/// is treated as a non-match and logged, rather than failing the whole
/// scan — a single bad document should not make a search request error
/// out for every client.
pub fn scan_parallel(snapshot: &[Option<std::path::PathBuf>], term: &str, requested_workers: usize) -> Vec<bool> {
    let total = snapshot.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = worker_count(requested_workers, total, num_cpus::get());
    let next = AtomicUsize::new(0);
    let words = total.div_ceil(64);
    let bitmap: Vec<AtomicU64> = (0..words).map(|_| AtomicU64::new(0)).collect();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let k = next.fetch_add(1, Ordering::Relaxed);
                if k >= total {
                    break;
                }
                let Some(path) = &snapshot[k] else { continue };
                match contains_keyword(path, term) {
                    Ok(true) => {
                        bitmap[k / 64].fetch_or(1u64 << (k % 64), Ordering::Relaxed);
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(key = k, error = %e, "scan worker failed to read document");
                    }
                }
            });
        }
    });

    (0..total)
        .map(|k| bitmap[k / 64].load(Ordering::Relaxed) & (1u64 << (k % 64)) != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn counts_matching_lines_including_trailing_line_without_newline() {
        let f = file_with("apple banana\napple\n");
        assert_eq!(count_keyword(f.path(), "apple", false).unwrap(), 2);

        let f2 = file_with("apple banana\napple");
        assert_eq!(count_keyword(f2.path(), "apple", false).unwrap(), 2);
    }

    #[test]
    fn stop_at_first_returns_one() {
        let f = file_with("apple banana\napple\napple\n");
        assert_eq!(count_keyword(f.path(), "apple", true).unwrap(), 1);
    }

    #[test]
    fn empty_term_never_matches() {
        let f = file_with("anything at all\n");
        assert_eq!(count_keyword(f.path(), "", false).unwrap(), 0);
        assert!(!contains_keyword(f.path(), "").unwrap());
    }

    #[test]
    fn worker_count_matches_the_formula() {
        assert_eq!(worker_count(4, 100, 2), 4);
        assert_eq!(worker_count(1000, 100, 2), 20); // capped at 10*ncpus
        assert_eq!(worker_count(4, 2, 2), 2); // capped at total
        assert_eq!(worker_count(0, 100, 2), 1); // never zero
    }

    #[test]
    fn scan_determinism_across_worker_counts() {
        let files: Vec<NamedTempFile> = vec![
            file_with("contains x here\n"),
            file_with("no match\n"),
            file_with("x\n"),
        ];
        let snapshot: Vec<Option<std::path::PathBuf>> =
            files.iter().map(|f| Some(f.path().to_path_buf())).collect();

        let expected = vec![true, false, true];
        for w in [1, 2, 3, 8] {
            assert_eq!(scan_parallel(&snapshot, "x", w), expected);
        }
    }

    #[test]
    fn tombstoned_slots_are_skipped() {
        let files: Vec<NamedTempFile> = vec![file_with("x\n")];
        let snapshot = vec![None, Some(files[0].path().to_path_buf())];
        assert_eq!(scan_parallel(&snapshot, "x", 4), vec![false, true]);
    }
}
