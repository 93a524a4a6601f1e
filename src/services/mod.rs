use std::time::Duration;

use anyhow::Context;

// Catalog browsing
pub mod catalog;

// Lead capture and quotations
pub mod leads;
pub mod quote_documents;

// AI estimator
pub mod estimator;
pub mod openai;

// Carrier rates
pub mod shipping;

// Customer portal
pub mod portal;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared outbound HTTP client for provider integrations.
///
/// `timeout` bounds connecting and each idle gap between reads, not the whole
/// exchange: estimator completions stream for minutes while tokens keep arriving.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .read_timeout(timeout)
        .user_agent(concat!("iron-catalog/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one response whose body chunks are written `gap` apart
    async fn dripping_server(chunks: Vec<&'static str>, gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let len: usize = chunks.iter().map(|c| c.len()).sum();
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                len
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            for chunk in chunks {
                tokio::time::sleep(gap).await;
                if socket.write_all(chunk.as_bytes()).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
            }
        });
        format!("http://{}/stream", addr)
    }

    async fn read_body(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
        let mut body = String::new();
        let mut stream = client.get(url).send().await?.bytes_stream();
        while let Some(chunk) = stream.next().await {
            body.push_str(&String::from_utf8_lossy(&chunk?));
        }
        Ok(body)
    }

    #[tokio::test]
    async fn slow_streams_outlive_the_timeout_while_data_flows() {
        let chunks = vec!["data: a\n\n", "data: b\n\n", "data: c\n\n", "data: d\n\n"];
        let url = dripping_server(chunks, Duration::from_millis(300)).await;
        let client = build_http_client(Duration::from_millis(800)).unwrap();

        let body = read_body(&client, &url).await.unwrap();
        assert_eq!(body, "data: a\n\ndata: b\n\ndata: c\n\ndata: d\n\n");
    }

    #[tokio::test]
    async fn stalled_streams_time_out() {
        let url = dripping_server(vec!["data: a\n\n"], Duration::from_millis(1500)).await;
        let client = build_http_client(Duration::from_millis(300)).unwrap();

        let err = read_body(&client, &url).await.unwrap_err();
        assert!(err.is_timeout());
    }
}
