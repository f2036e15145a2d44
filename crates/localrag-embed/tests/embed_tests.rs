use std::time::Duration;

use localrag_core::error::Error;
use localrag_core::traits::Embedder;
use localrag_embed::OllamaEmbedder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response per connection and return the base URL.
async fn serve(status: &'static str, body: String, connections: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        for _ in 0..connections {
            let Ok((mut sock, _)) = listener.accept().await else { return };
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = sock.read(&mut chunk).await.unwrap_or(0);
                if n == 0 { break; }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let len = text[..head_end]
                        .lines()
                        .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap_or(0)))
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + len { break; }
                }
            }
            let resp = format!("HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}", body.len());
            let _ = sock.write_all(resp.as_bytes()).await;
            let _ = sock.shutdown().await;
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn parses_embeddings_from_service() {
    let url = serve("200 OK", r#"{"model":"m","embeddings":[[0.1,0.2,0.3],[0.3,0.2,0.1]]}"#.to_string(), 1).await;
    let e = OllamaEmbedder::new(&url, "m", 3, Duration::from_secs(5), 32).expect("client");
    let vs = e.embed_batch(&["a".to_string(), "b".to_string()]).await.expect("embed");
    assert_eq!(vs.len(), 2);
    assert_eq!(vs[1], vec![0.3, 0.2, 0.1]);
}

#[tokio::test]
async fn wrong_vector_length_is_a_dimension_mismatch() {
    let url = serve("200 OK", r#"{"embeddings":[[0.1,0.2]]}"#.to_string(), 1).await;
    let e = OllamaEmbedder::new(&url, "m", 3, Duration::from_secs(5), 32).expect("client");
    let err = e.embed("a").await.expect_err("mismatch");
    assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
}

#[tokio::test]
async fn service_error_is_an_embedding_error() {
    let url = serve("404 Not Found", r#"{"error":"model \"m\" not found"}"#.to_string(), 1).await;
    let e = OllamaEmbedder::new(&url, "m", 3, Duration::from_secs(5), 32).expect("client");
    let err = e.embed("a").await.expect_err("not found");
    assert!(matches!(err, Error::Embedding(ref msg) if msg.contains("not found")), "{err}");
}

#[tokio::test]
async fn unreachable_service_is_an_embedding_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let e = OllamaEmbedder::new(&format!("http://{addr}"), "m", 3, Duration::from_secs(2), 32).expect("client");
    assert!(matches!(e.embed("a").await, Err(Error::Embedding(_))));
}
