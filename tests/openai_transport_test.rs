//! OpenAI 传输层集成测试：本地桩服务返回错误状态，确认每次 complete 只发一个请求并正确归类

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use reply_helper::config::LlmSection;
    use reply_helper::core::{ErrorKind, GenerationRequest, ModelId, Tone};
    use reply_helper::llm::{CompletionClient, OpenAiClient};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// 读完一个 HTTP 请求（头 + Content-Length 指定的正文）
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);
            let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                return;
            }
        }
    }

    /// 对每个请求都回同一个状态码与 JSON 正文，返回 base_url 与命中计数
    async fn stub_server(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    read_request(&mut stream).await;
                    let response = format!(
                        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        (format!("http://{addr}/v1"), hits)
    }

    fn client_for(base_url: String) -> OpenAiClient {
        let mut llm = LlmSection {
            base_url: Some(base_url),
            ..LlmSection::default()
        };
        llm.timeouts.request = 10;
        OpenAiClient::from_config(&llm, "sk-test")
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("Can we move the call to Friday?", Tone::Polite, ModelId::default())
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_after_one_request() {
        let (base_url, hits) = stub_server(
            "429 Too Many Requests",
            r#"{"error":{"message":"Rate limit reached for requests","type":"requests","param":null,"code":"rate_limit_exceeded"}}"#,
        )
        .await;

        let started = Instant::now();
        let err = client_for(base_url).complete(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_server_error_surfaces_after_one_request() {
        let (base_url, hits) = stub_server(
            "503 Service Unavailable",
            r#"{"error":{"message":"The server is overloaded"}}"#,
        )
        .await;

        let err = client_for(base_url).complete(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_key_is_unauthorized() {
        let (base_url, hits) = stub_server(
            "401 Unauthorized",
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#,
        )
        .await;

        let err = client_for(base_url).complete(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
