//! HTTP transport used by the collectors

use crate::{CollectorConfig, CollectorError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

/// Minimal request surface the collectors need.
///
/// Implementations return the response body of a successful (2xx) request
/// and an error for anything else. `bearer` is attached as an
/// `Authorization` header when present.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<String>;

    async fn post_json(&self, url: &str, bearer: Option<&str>, body: &Value) -> Result<String>;
}

/// `reqwest`-backed transport
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| CollectorError::Config(format!("user agent: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client })
    }

    async fn send(
        &self,
        url: &str,
        request: RequestBuilder,
        bearer: Option<&str>,
    ) -> Result<String> {
        let request = match bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        check_rate_limit(&response)?;

        let status = response.status();
        debug!(url = url, status = status.as_u16(), "Response received");
        if !status.is_success() {
            return Err(CollectorError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<String> {
        self.send(url, self.client.get(url), bearer).await
    }

    async fn post_json(&self, url: &str, bearer: Option<&str>, body: &Value) -> Result<String> {
        self.send(url, self.client.post(url).json(body), bearer).await
    }
}

fn check_rate_limit(response: &Response) -> Result<()> {
    if response.status() == StatusCode::FORBIDDEN
        || response.status() == StatusCode::TOO_MANY_REQUESTS
    {
        if let Some(remaining) = response.headers().get("x-ratelimit-remaining") {
            if remaining == "0" {
                let reset = response
                    .headers()
                    .get("x-ratelimit-reset")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);

                let now = Utc::now().timestamp() as u64;
                let wait = reset.saturating_sub(now);

                return Err(CollectorError::RateLimited(wait));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::GithubCollector;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const EMPTY_LIST: &str = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
        content-length: 2\r\nconnection: close\r\n\r\n[]";

    /// Answer a single connection with `reply`; the handle yields the raw request
    async fn serve_once(reply: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn transport(timeout: Duration) -> ReqwestTransport {
        ReqwestTransport::new(&CollectorConfig::anonymous().with_timeout(timeout)).unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let (base, server) = serve_once(EMPTY_LIST).await;

        let body = transport(Duration::from_secs(5))
            .get(&format!("{}/users/octocat/orgs", base), None)
            .await
            .unwrap();
        assert_eq!(body, "[]");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /users/octocat/orgs HTTP/1.1"));
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base, _server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\n\
             connection: close\r\n\r\n",
        )
        .await;
        let url = format!("{}/users/octocat", base);

        let result = transport(Duration::from_secs(5)).get(&url, None).await;
        match result {
            Err(CollectorError::Status { status, url: failed }) => {
                assert_eq!(status, 500);
                assert_eq!(failed, url);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit() {
        let (base, _server) = serve_once(
            "HTTP/1.1 403 Forbidden\r\nx-ratelimit-remaining: 0\r\n\
             x-ratelimit-reset: 0\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let result = transport(Duration::from_secs(5))
            .get(&format!("{}/users/octocat", base), None)
            .await;
        assert!(matches!(result, Err(CollectorError::RateLimited(0))));
    }

    #[tokio::test]
    async fn test_forbidden_without_rate_limit_is_status() {
        let (base, _server) = serve_once(
            "HTTP/1.1 403 Forbidden\r\nx-ratelimit-remaining: 12\r\n\
             content-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let result = transport(Duration::from_secs(5))
            .get(&format!("{}/users/octocat", base), None)
            .await;
        assert!(matches!(result, Err(CollectorError::Status { status: 403, .. })));
    }

    #[tokio::test]
    async fn test_token_sent_as_bearer_header() {
        let (base, server) = serve_once(EMPTY_LIST).await;
        let config = CollectorConfig::anonymous()
            .with_base_url(&base)
            .with_token(Some("ghp_secret".into()));
        let collector = GithubCollector::new(config).unwrap();

        assert!(collector.load_organizations("octocat").await.is_empty());

        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("authorization: bearer ghp_secret"));
        assert!(request.contains("user-agent: devpulse/"));
    }

    #[tokio::test]
    async fn test_hung_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let config = CollectorConfig::anonymous()
            .with_base_url(&base)
            .with_timeout(Duration::from_millis(300));
        let collector = GithubCollector::with_transport(
            config.clone(),
            Arc::new(ReqwestTransport::new(&config).unwrap()),
        );

        let started = Instant::now();
        assert!(collector.load_profile("octocat").await.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
