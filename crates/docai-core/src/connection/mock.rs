//! Mock connector for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ConnectError, Connection, Connector, ProcessFuture, RemoteError};
use crate::document::{Document, ProcessRequest, ProcessResponse};
use crate::resource::Endpoint;

/// A configurable mock response for [`MockConnector`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Simulate a processed document.
    Document(Document),
    /// Simulate a transport or service failure.
    Error(RemoteError),
}

impl MockResponse {
    /// A document whose only content is `text`.
    pub fn text(text: impl Into<String>) -> Self {
        MockResponse::Document(Document {
            text: text.into(),
            ..Document::default()
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        MockResponse::Error(RemoteError::transport(message))
    }
}

/// Counters and captured requests, shared between a connector and every
/// connection it hands out.
#[derive(Debug, Default)]
pub struct MockStats {
    connects: AtomicUsize,
    process_calls: AtomicUsize,
    closes: AtomicUsize,
    endpoints: Mutex<Vec<Endpoint>>,
    requests: Mutex<Vec<ProcessRequest>>,
}

impl MockStats {
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn process_count(&self) -> usize {
        self.process_calls.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Endpoints passed to `connect`, in call order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Requests passed to `process`, in call order.
    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

/// A hand-rolled mock implementing [`Connector`].
///
/// Supports:
/// - A fixed response for every `process` call.
/// - Failing `connect` with a given message.
/// - Optional per-call latency.
/// - Call and close counting via [`stats()`](MockConnector::stats).
pub struct MockConnector {
    response: MockResponse,
    connect_error: Option<String>,
    delay: Option<Duration>,
    stats: Arc<MockStats>,
}

impl MockConnector {
    /// Create a mock whose connections always answer with `response`.
    pub fn new(response: MockResponse) -> Self {
        Self {
            response,
            connect_error: None,
            delay: None,
            stats: Arc::new(MockStats::default()),
        }
    }

    /// Make every `connect` fail with `message`.
    pub fn failing_connect(message: impl Into<String>) -> Self {
        Self {
            connect_error: Some(message.into()),
            ..Self::new(MockResponse::text(""))
        }
    }

    /// Set simulated network latency per `process` call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }
}

impl Connector for MockConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectError> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut endpoints) = self.stats.endpoints.lock() {
            endpoints.push(endpoint.clone());
        }
        if let Some(ref msg) = self.connect_error {
            return Err(ConnectError::Other(msg.clone()));
        }
        Ok(Box::new(MockConnection {
            response: self.response.clone(),
            delay: self.delay,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct MockConnection {
    response: MockResponse,
    delay: Option<Duration>,
    stats: Arc<MockStats>,
}

impl Connection for MockConnection {
    fn process<'a>(&'a self, request: &'a ProcessRequest) -> ProcessFuture<'a> {
        let response = self.response.clone();
        let delay = self.delay;

        // Counted on first poll, so a future dropped unpolled is no call.
        Box::pin(async move {
            self.stats.process_calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.stats.requests.lock() {
                requests.push(request.clone());
            }
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }

            match response {
                MockResponse::Document(document) => Ok(ProcessResponse {
                    document: Some(document),
                }),
                MockResponse::Error(err) => Err(err),
            }
        })
    }

    fn close(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}
