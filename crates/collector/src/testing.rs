//! Closure-backed transport for exercising collectors offline

use crate::transport::Transport;
use crate::{CollectorError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

/// A request as seen by [`FnTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

/// Scripted answer to a request
#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Status(u16),
    Fail,
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Reply::Body(value.to_string())
    }

    pub fn after(self, delay: Duration) -> Self {
        Reply::Delayed(delay, Box::new(self))
    }
}

type Handler = Box<dyn Fn(&RecordedRequest) -> Reply + Send + Sync>;

/// Answers every request from a closure and records what was asked
pub struct FnTransport {
    handler: Handler,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FnTransport {
    pub fn new(handler: impl Fn(&RecordedRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    async fn answer(&self, request: RecordedRequest) -> Result<String> {
        let mut reply = (self.handler)(&request);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        loop {
            match reply {
                Reply::Body(body) => return Ok(body),
                Reply::Status(status) => {
                    return Err(CollectorError::Status {
                        status,
                        url: request.url,
                    })
                }
                Reply::Fail => return Err(CollectorError::Api("connection refused".to_string())),
                Reply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}

#[async_trait]
impl Transport for FnTransport {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<String> {
        self.answer(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            bearer: bearer.map(str::to_string),
            body: None,
        })
        .await
    }

    async fn post_json(&self, url: &str, bearer: Option<&str>, body: &Value) -> Result<String> {
        self.answer(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            bearer: bearer.map(str::to_string),
            body: Some(body.clone()),
        })
        .await
    }
}
