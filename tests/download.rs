// Artifact retrieval against a loopback HTTP server.
//
// Each test serves exactly one canned response from a TcpListener thread, so
// the full download → gunzip → untar → rename path runs for real without
// leaving the machine.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use flagembed::download::retrieve_model_from;
use flagembed::{EmbeddingModel, Error};
use flate2::write::GzEncoder;
use flate2::Compression;

/// A base URL with nothing listening; hitting it is a transport error.
const DEAD_BASE: &str = "http://127.0.0.1:1";

/// Serves one HTTP response on a fresh loopback port, then exits.
fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let header = format!(
                "{status_line}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        }
    });
    format!("http://{addr}")
}

/// A minimal model archive: tokenizer definition + weights file at the root,
/// exactly the layout retrieval promises callers.
fn model_archive() -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    for (name, contents) in [
        ("tokenizer.json", &b"{\"model\": {\"type\": \"WordPiece\"}}"[..]),
        ("model_optimized.onnx", &b"not real weights"[..]),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, contents).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

#[test]
fn test_cold_cache_downloads_and_extracts() -> anyhow::Result<()> {
    let cache = tempfile::tempdir()?;
    let base = serve_once("HTTP/1.1 200 OK", model_archive());

    let model_dir = retrieve_model_from(&base, EmbeddingModel::AllMiniLmL6V2, cache.path(), false)?;

    assert_eq!(model_dir, cache.path().join("fast-all-MiniLM-L6-v2"));
    assert!(model_dir.join("tokenizer.json").is_file());
    assert!(model_dir.join("model_optimized.onnx").is_file());
    Ok(())
}

#[test]
fn test_second_resolution_skips_the_network() -> anyhow::Result<()> {
    let cache = tempfile::tempdir()?;
    let base = serve_once("HTTP/1.1 200 OK", model_archive());

    let first = retrieve_model_from(&base, EmbeddingModel::BgeSmallEn, cache.path(), false)?;

    // The server answered once and is gone; a second resolution must come
    // from the cache alone.
    let second = retrieve_model_from(DEAD_BASE, EmbeddingModel::BgeSmallEn, cache.path(), false)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_missing_archive_surfaces_status_text() {
    let cache = tempfile::tempdir().unwrap();
    let base = serve_once("HTTP/1.1 404 Not Found", b"no such object".to_vec());

    let err = retrieve_model_from(&base, EmbeddingModel::BgeBaseEn, cache.path(), false).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("404"), "message was {message:?}");
    assert!(message.contains("Not Found"), "message was {message:?}");

    // Nothing resolvable may be left behind; a retry against a healthy
    // server must succeed.
    assert!(!cache.path().join("fast-bge-base-en").exists());
    let base = serve_once("HTTP/1.1 200 OK", model_archive());
    retrieve_model_from(&base, EmbeddingModel::BgeBaseEn, cache.path(), false).unwrap();
}

#[test]
fn test_corrupt_archive_leaves_no_cache_entry() {
    let cache = tempfile::tempdir().unwrap();
    let base = serve_once("HTTP/1.1 200 OK", b"this is not a gzip stream".to_vec());

    let err = retrieve_model_from(&base, EmbeddingModel::BgeSmallEn, cache.path(), false).unwrap_err();
    assert!(matches!(err, Error::Extract { .. }), "got {err:?}");

    // Neither the final directory nor the staging directory may survive.
    let leftovers: Vec<_> = std::fs::read_dir(cache.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "cache not empty: {leftovers:?}");

    // The failed attempt must not poison a later, healthy one.
    let base = serve_once("HTTP/1.1 200 OK", model_archive());
    retrieve_model_from(&base, EmbeddingModel::BgeSmallEn, cache.path(), false).unwrap();
}

#[test]
fn test_unreachable_host_is_a_transport_error() {
    let cache = tempfile::tempdir().unwrap();
    let err = retrieve_model_from(DEAD_BASE, EmbeddingModel::BgeSmallEn, cache.path(), false).unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}
