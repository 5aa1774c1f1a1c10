//! End-to-end tests driving a real `docindexd` subprocess over its Unix
//! domain socket.

use std::process::{Child, Command};
use std::time::Duration;

use docindex_client::ClientBuilder;
use docindex_core::schema::{lookup_by_opcode, Opcode};
use tokio::time::sleep;

struct ServerProcess {
    child: Child,
}

impl ServerProcess {
    fn start(doc_root: &std::path::Path, cache_size: &str, socket_path: &std::path::Path) -> Self {
        let child = Command::new(env!("CARGO"))
            .args([
                "run",
                "-p",
                "docindex-server",
                "--",
                "--socket-path",
            ])
            .arg(socket_path)
            .arg(doc_root)
            .arg(cache_size)
            .spawn()
            .expect("failed to start docindexd");
        ServerProcess { child }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn wait_for_socket(path: &std::path::Path) {
    for _ in 0..100 {
        if path.exists() {
            return;
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!("docindexd never created its socket at {path:?}");
}

/// Runs the six literal scenarios from the example walkthrough in order,
/// against one running server, asserting the exact reply text.
#[tokio::test]
async fn full_workflow_matches_the_example_scenarios() {
    let doc_root = tempfile::tempdir().unwrap();
    std::fs::write(doc_root.path().join("f.txt"), "apple banana\napple\n").unwrap();

    let socket_path = doc_root.path().join("docindex.sock");
    let mut server = ServerProcess::start(doc_root.path(), "8", &socket_path);
    wait_for_socket(&socket_path).await;

    let mut client = ClientBuilder::new(socket_path.clone())
        .connect()
        .await
        .expect("connecting to docindexd");

    // Scenario 1: empty add.
    let add_entry = lookup_by_opcode(Opcode::A).unwrap();
    let (_, lines) = client
        .call(
            add_entry,
            &["T".into(), "A".into(), "2020".into(), "f.txt".into()],
        )
        .await
        .unwrap();
    assert_eq!(lines, vec!["Document 0 indexed".to_string()]);

    // Scenario 2: consult present.
    let consult_entry = lookup_by_opcode(Opcode::C).unwrap();
    let (_, lines) = client.call(consult_entry, &["0".into()]).await.unwrap();
    assert_eq!(
        lines,
        vec![
            "Title: T".to_string(),
            "Authors: A".to_string(),
            "Year: 2020".to_string(),
            "Path: f.txt".to_string(),
        ]
    );

    // Scenario 3: consult absent.
    let (_, lines) = client.call(consult_entry, &["999".into()]).await.unwrap();
    assert_eq!(lines, vec!["Document not found".to_string()]);

    // Scenario 4: list count.
    let list_entry = lookup_by_opcode(Opcode::L).unwrap();
    let (_, lines) = client
        .call(list_entry, &["0".into(), "apple".into()])
        .await
        .unwrap();
    assert_eq!(lines, vec!["2".to_string()]);

    // Add two more documents (keys 1, 2) so a search has something to
    // hit, then delete key 1 — scenario 5 expects hits at 0 and 2 only.
    client
        .call(add_entry, &["T2".into(), "A2".into(), "2021".into(), "f.txt".into()])
        .await
        .unwrap();
    client
        .call(add_entry, &["T3".into(), "A3".into(), "2022".into(), "f.txt".into()])
        .await
        .unwrap();
    let delete_entry = lookup_by_opcode(Opcode::D).unwrap();
    client.call(delete_entry, &["1".into()]).await.unwrap();

    // Scenario 5: search with cache.
    let search_entry = lookup_by_opcode(Opcode::S).unwrap();
    let (_, first) = client
        .call(search_entry, &["apple".into(), "4".into()])
        .await
        .unwrap();
    assert_eq!(first, vec!["[0, 2]".to_string()]);

    let (_, second) = client
        .call(search_entry, &["apple".into(), "4".into()])
        .await
        .unwrap();
    assert_eq!(second, first, "a repeat search must be byte-identical, served from cache");

    // Scenario 6: shutdown.
    let flush_entry = lookup_by_opcode(Opcode::F).unwrap();
    let (_, lines) = client.call(flush_entry, &[]).await.unwrap();
    assert_eq!(lines, vec!["Server is shutting down".to_string()]);

    let status = tokio::task::spawn_blocking(move || server.child.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(status.success(), "docindexd should exit 0 after -f");
}

/// A frame with an opcode outside `Opcode::ALL` is dropped outright: the
/// connection stays open but no reply is ever written, so a bounded read
/// on the client side times out.
#[tokio::test]
async fn unknown_opcode_is_dropped_without_a_reply() {
    use docindex_core::protocol::{header::REQUEST_HEADER_SIZE, RequestBuilder};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    let doc_root = tempfile::tempdir().unwrap();
    let socket_path = doc_root.path().join("docindex.sock");
    let _server = ServerProcess::start(doc_root.path(), "0", &socket_path);
    wait_for_socket(&socket_path).await;

    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    let frame = RequestBuilder::new(200, 1).finish().unwrap();
    assert!(frame.len() >= REQUEST_HEADER_SIZE);
    stream.write_all(&frame).await.unwrap();
    stream.flush().await.unwrap();

    let mut buf = [0u8; 4];
    let result = tokio::time::timeout(Duration::from_millis(500), stream.read(&mut buf)).await;
    assert!(result.is_err(), "no reply should ever arrive for an unknown opcode");
}
