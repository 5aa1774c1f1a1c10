//! Actor owning the document store and response cache.
//!
//! A single task exclusively owns the mutable state; every connection
//! task sends it a message and awaits the reply over a oneshot channel.
//! `ServerHandle` can be cloned and shared across every connection task.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, Notify};

use docindex_core::{scan, DocIndexError, DocumentStore, Result};

use crate::handlers;

type Reply = Result<Bytes>;

/// Message types the actor understands — one per opcode that needs
/// access to the store or cache.
pub enum ServerMessage {
    Add {
        title: String,
        authors: String,
        year: u32,
        path: String,
        respond: oneshot::Sender<Reply>,
    },
    Consult {
        key: i32,
        respond: oneshot::Sender<Reply>,
    },
    Delete {
        key: i32,
        respond: oneshot::Sender<Reply>,
    },
    ListCount {
        key: i32,
        term: String,
        respond: oneshot::Sender<Reply>,
    },
    Search {
        term: String,
        workers: usize,
        respond: oneshot::Sender<Reply>,
    },
    Flush {
        respond: oneshot::Sender<Bytes>,
    },
}

/// Handle to communicate with the server actor.
///
/// Cloned into every accepted connection's task. All operations are
/// async and send exactly one message, awaiting exactly one reply.
#[derive(Clone)]
pub struct ServerHandle {
    tx: mpsc::Sender<ServerMessage>,
    /// Fires once the actor has processed a `Flush` and exited its loop;
    /// `main` awaits this to stop accepting new connections.
    pub shutdown: Arc<Notify>,
}

impl ServerHandle {
    async fn send(&self, msg: ServerMessage, rx: oneshot::Receiver<Reply>) -> Reply {
        if self.tx.send(msg).await.is_err() {
            return Err(DocIndexError::StateError);
        }
        rx.await.map_err(|_| DocIndexError::StateError)?
    }

    pub async fn add(&self, title: String, authors: String, year: u32, path: String) -> Reply {
        let (respond, rx) = oneshot::channel();
        self.send(
            ServerMessage::Add { title, authors, year, path, respond },
            rx,
        )
        .await
    }

    pub async fn consult(&self, key: i32) -> Reply {
        let (respond, rx) = oneshot::channel();
        self.send(ServerMessage::Consult { key, respond }, rx).await
    }

    pub async fn delete(&self, key: i32) -> Reply {
        let (respond, rx) = oneshot::channel();
        self.send(ServerMessage::Delete { key, respond }, rx).await
    }

    pub async fn list_count(&self, key: i32, term: String) -> Reply {
        let (respond, rx) = oneshot::channel();
        self.send(ServerMessage::ListCount { key, term, respond }, rx).await
    }

    pub async fn search(&self, term: String, workers: usize) -> Reply {
        let (respond, rx) = oneshot::channel();
        self.send(ServerMessage::Search { term, workers, respond }, rx).await
    }

    /// Sends the shutdown message and returns its reply frame. Falls
    /// back to building the reply locally if the actor has already
    /// gone away (e.g. a second connection racing the first `-f`).
    pub async fn flush(&self) -> Bytes {
        let (respond, rx) = oneshot::channel();
        if self.tx.send(ServerMessage::Flush { respond }).await.is_err() {
            return handlers::handle_flush();
        }
        rx.await.unwrap_or_else(|_| handlers::handle_flush())
    }
}

/// Spawns the actor task, returning a handle to it.
///
/// `doc_root` is where document files and the index/cache persistence
/// files live. `cache` is the already-constructed cache backend — real
/// LRU or no-op, selected by the caller.
pub fn spawn(
    doc_root: PathBuf,
    store: DocumentStore,
    cache: Box<dyn docindex_core::ResponseCache>,
    buffer_size: usize,
) -> ServerHandle {
    let (tx, rx) = mpsc::channel(buffer_size);
    let shutdown = Arc::new(Notify::new());
    let shutdown_clone = Arc::clone(&shutdown);

    tokio::spawn(async move {
        run_actor(rx, doc_root, store, cache).await;
        shutdown_clone.notify_waiters();
    });

    ServerHandle { tx, shutdown }
}

async fn run_actor(
    mut rx: mpsc::Receiver<ServerMessage>,
    doc_root: PathBuf,
    mut store: DocumentStore,
    mut cache: Box<dyn docindex_core::ResponseCache>,
) {
    while let Some(msg) = rx.recv().await {
        match msg {
            ServerMessage::Add { title, authors, year, path, respond } => {
                let reply = handlers::handle_add(&mut store, &title, &authors, year, &path);
                let _ = respond.send(reply);
            }
            ServerMessage::Consult { key, respond } => {
                let reply = handlers::handle_consult(&mut store, key);
                let _ = respond.send(reply);
            }
            ServerMessage::Delete { key, respond } => {
                let reply = handlers::handle_delete(&mut store, key);
                let _ = respond.send(reply);
            }
            ServerMessage::ListCount { key, term, respond } => {
                let reply = handlers::handle_list(&mut store, &doc_root, key, &term);
                let _ = respond.send(reply);
            }
            ServerMessage::Search { term, workers, respond } => {
                let reply = handle_search(&mut store, &doc_root, cache.as_mut(), &term, workers).await;
                let _ = respond.send(reply);
            }
            ServerMessage::Flush { respond } => {
                if let Err(e) = cache.cleanup() {
                    tracing::error!(error = %e, "failed to persist cache on shutdown");
                }
                let _ = respond.send(handlers::handle_flush());
                break;
            }
        }
    }

    tracing::info!("server actor shutting down");
}

async fn handle_search(
    store: &mut DocumentStore,
    doc_root: &std::path::Path,
    cache: &mut dyn docindex_core::ResponseCache,
    term: &str,
    workers: usize,
) -> Reply {
    if let Some(cached) = cache.get(term) {
        tracing::debug!(term, "search cache hit");
        return Ok(cached);
    }
    tracing::debug!(term, "search cache miss");

    let total = store.total()?;
    let mut snapshot = Vec::with_capacity(total);
    for key in 0..total as i32 {
        match store.get(key) {
            Ok(doc) => snapshot.push(Some(doc_root.join(doc.path))),
            Err(DocIndexError::NotFound) => snapshot.push(None),
            Err(e) => return Err(e),
        }
    }

    let term_owned = term.to_string();
    let started = std::time::Instant::now();
    let hits = tokio::task::spawn_blocking(move || scan::scan_parallel(&snapshot, &term_owned, workers))
        .await
        .map_err(|_| DocIndexError::StateError)?;
    tracing::debug!(term, elapsed_ms = started.elapsed().as_millis() as u64, "search fan-out complete");

    let reply = handlers::render_search_reply(&hits)?;
    cache.put(term, reply.clone());
    Ok(reply)
}
