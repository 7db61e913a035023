//! HTTP transport abstraction: production uses `reqwest`; tests inject a
//! fake so delivery/retry logic can be exercised without a network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by `reqwest`, matching the original
/// service's `httpx.AsyncClient` role.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.into())
            .build()
            .expect("reqwest client builds with default TLS config");
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.post(url).json(body).timeout(timeout);
        for (name, value) in &headers {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(TransportResponse { status, body })
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod fake {
    use super::*;
    use std::sync::Mutex;

    /// A scripted transport: returns the next entry in `responses` for each
    /// call, or a transport error if the script is exhausted or an explicit
    /// `Err` entry is hit.
    pub struct ScriptedTransport {
        responses: Mutex<std::collections::VecDeque<Result<TransportResponse, TransportError>>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(
            &self,
            url: &str,
            _headers: HashMap<String, String>,
            _body: &serde_json::Value,
            _timeout: Duration,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.lock().expect("lock poisoned").push(url.to_string());
            self.responses
                .lock()
                .expect("lock poisoned")
                .pop_front()
                .unwrap_or(Err(TransportError::Network("script exhausted".into())))
        }
    }
}
