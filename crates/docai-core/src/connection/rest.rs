//! REST transport: `POST {base}/v1/{name}:process` with a bearer token.

use std::time::Instant;

use serde::Deserialize;

use super::{ConnectError, Connection, Connector, ProcessFuture, RemoteError};
use crate::credentials::Credentials;
use crate::document::{ProcessRequest, ProcessResponse};
use crate::resource::Endpoint;

const USER_AGENT: &str = concat!("docai-rs/", env!("CARGO_PKG_VERSION"));

/// Builds reqwest-backed connections using ambient credentials.
#[derive(Clone, Default)]
pub struct RestConnector {
    /// Replaces the regional endpoint (emulators, test servers).
    base_url: Option<String>,
    /// Token used instead of the environment.
    access_token: Option<String>,
}

impl RestConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for RestConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestConnector")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Connector for RestConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectError> {
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| endpoint.base_url());
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|_| ConnectError::InvalidEndpoint(base_url.clone()))?;
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConnectError::InvalidEndpoint(base_url));
        }
        // Without an override the token may only go to the regional host.
        if self.base_url.is_none()
            && (parsed.host_str() != Some(endpoint.host.as_str())
                || parsed.port_or_known_default() != Some(endpoint.port))
        {
            return Err(ConnectError::InvalidEndpoint(base_url));
        }

        let credentials = Credentials::from_env(self.access_token.as_deref())?;
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        tracing::debug!(
            endpoint = %endpoint,
            base_url = %base_url,
            token_source = credentials.source(),
            "connected"
        );

        Ok(Box::new(RestConnection {
            client: Some(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }))
    }
}

/// A live REST client for one endpoint.
pub struct RestConnection {
    client: Option<reqwest::Client>,
    base_url: String,
    credentials: Credentials,
}

impl RestConnection {
    fn process_url(&self, name: &str) -> String {
        format!("{}/v1/{}:process", self.base_url, name)
    }
}

impl Connection for RestConnection {
    fn process<'a>(&'a self, request: &'a ProcessRequest) -> ProcessFuture<'a> {
        Box::pin(async move {
            let client = self
                .client
                .as_ref()
                .ok_or_else(|| RemoteError::transport("connection already closed"))?;

            let url = self.process_url(&request.name);
            let start = Instant::now();

            let resp = client
                .post(&url)
                .bearer_auth(self.credentials.token())
                .json(request)
                .send()
                .await
                .map_err(|e| RemoteError::transport(e.to_string()))?;

            let status = resp.status();
            tracing::debug!(
                url = %url,
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "process call returned"
            );

            if !status.is_success() {
                let body = match resp.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::debug!(error = %e, "failed to read error body");
                        String::new()
                    }
                };
                return Err(remote_error_from(status, &body));
            }

            resp.json::<ProcessResponse>()
                .await
                .map_err(|e| RemoteError::transport(format!("invalid response body: {}", e)))
        })
    }

    fn close(&mut self) {
        self.client = None;
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Turn a non-2xx response into a [`RemoteError`], reading the Google error
/// envelope when the body carries one.
pub(crate) fn remote_error_from(status: reqwest::StatusCode, body: &str) -> RemoteError {
    let code = status.as_u16();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = if envelope.error.message.is_empty() {
            canonical_reason(status)
        } else {
            envelope.error.message
        };
        return RemoteError::service(code, envelope.error.status, message);
    }

    let body = body.trim();
    let message = if body.is_empty() {
        canonical_reason(status)
    } else {
        body.to_string()
    };
    RemoteError::service(code, None, message)
}

fn canonical_reason(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}
