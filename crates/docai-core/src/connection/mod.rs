//! Transport seam between the facade and the remote service.
//!
//! A [`Connector`] builds one [`Connection`] per call, bound to a regional
//! endpoint. The facade wraps it in a [`ConnectionGuard`] so that
//! [`Connection::close`] runs exactly once however the call ends.

pub mod mock;
pub mod rest;

use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use thiserror::Error;

use crate::credentials::CredentialsError;
use crate::document::{ProcessRequest, ProcessResponse};
use crate::resource::Endpoint;

pub use rest::{RestConnection, RestConnector};

/// Future returned by [`Connection::process`].
pub type ProcessFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ProcessResponse, RemoteError>> + Send + 'a>>;

/// Builds connections to a regional endpoint.
pub trait Connector: Send + Sync {
    /// Establish a client bound to `endpoint`.
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectError>;
}

/// An open client for a single endpoint.
pub trait Connection: Send + Sync {
    /// Send one process request and wait for the service's answer.
    fn process<'a>(&'a self, request: &'a ProcessRequest) -> ProcessFuture<'a>;

    /// Release the underlying client. Called once by [`ConnectionGuard`].
    fn close(&mut self);
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("credentials: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// A failed remote call, as reported by the transport or the service.
///
/// Transport failures (DNS, TLS, connection reset, timeout) carry no HTTP
/// status. Service failures carry the HTTP status and, when the body held a
/// Google error envelope, its canonical status string (e.g.
/// `PERMISSION_DENIED`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub http_status: Option<u16>,
    pub status: Option<String>,
    pub message: String,
}

impl RemoteError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            http_status: None,
            status: None,
            message: message.into(),
        }
    }

    pub fn service(http_status: u16, status: Option<String>, message: impl Into<String>) -> Self {
        Self {
            http_status: Some(http_status),
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.http_status, &self.status) {
            (Some(code), Some(status)) => write!(f, "HTTP {} {}: {}", code, status, self.message),
            (Some(code), None) => write!(f, "HTTP {}: {}", code, self.message),
            (None, _) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Owns a connection and closes it on drop.
///
/// Drop covers every exit: early `?` returns, panics, and the enclosing
/// future being dropped on cancellation.
pub struct ConnectionGuard {
    conn: Box<dyn Connection>,
}

impl ConnectionGuard {
    pub fn new(conn: Box<dyn Connection>) -> Self {
        Self { conn }
    }
}

impl Deref for ConnectionGuard {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref()
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.conn.close();
        tracing::debug!("connection released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::mock::{MockConnector, MockResponse};

    #[test]
    fn remote_error_display() {
        let e = RemoteError::service(403, Some("PERMISSION_DENIED".into()), "denied");
        assert_eq!(e.to_string(), "HTTP 403 PERMISSION_DENIED: denied");

        let e = RemoteError::service(502, None, "Bad Gateway");
        assert_eq!(e.to_string(), "HTTP 502: Bad Gateway");

        let e = RemoteError::transport("connection refused");
        assert_eq!(e.to_string(), "connection refused");
    }

    #[test]
    fn guard_closes_once_on_drop() {
        let connector = MockConnector::new(MockResponse::text("x"));
        let stats = connector.stats();
        {
            let conn = connector
                .connect(&Endpoint::for_location("us"))
                .unwrap();
            let _guard = ConnectionGuard::new(conn);
            assert_eq!(stats.close_count(), 0);
        }
        assert_eq!(stats.close_count(), 1);
    }
}
