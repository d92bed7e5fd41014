//! The document-processing facade: read a file, send it, print the text.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::ProcessError;
use crate::connection::{ConnectionGuard, Connector, RestConnector};
use crate::document::{ProcessRequest, ProcessingResult, RawDocument};
use crate::resource::ProcessorReference;

/// Prefix written before the extracted text.
pub const OUTPUT_PREFIX: &str = "Document Text: ";

/// Sends single documents to a processor through a [`Connector`].
///
/// Each call opens its own connection, makes exactly one remote request,
/// and closes the connection before returning. Calls share no state.
#[derive(Clone)]
pub struct DocumentProcessor {
    connector: Arc<dyn Connector>,
    cancel: Option<CancellationToken>,
}

impl DocumentProcessor {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            cancel: None,
        }
    }

    /// Abort the in-flight remote call when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Process the file at `file_path` and return the service's result.
    pub async fn process(
        &self,
        reference: &ProcessorReference,
        file_path: &Path,
        mime_type: &str,
    ) -> Result<ProcessingResult, ProcessError> {
        let span = tracing::info_span!("process_document", resource = %reference);
        self.run(reference, file_path, mime_type)
            .instrument(span)
            .await
    }

    /// Like [`process`](Self::process), then write `Document Text: {text}`
    /// to `w`. Nothing is written if any step fails.
    pub async fn process_to<W: Write + ?Sized>(
        &self,
        w: &mut W,
        reference: &ProcessorReference,
        file_path: &Path,
        mime_type: &str,
    ) -> Result<(), ProcessError> {
        let result = self.process(reference, file_path, mime_type).await?;
        write_result(w, &result)
    }

    async fn run(
        &self,
        reference: &ProcessorReference,
        file_path: &Path,
        mime_type: &str,
    ) -> Result<ProcessingResult, ProcessError> {
        let endpoint = reference.endpoint();
        let conn = self
            .connector
            .connect(&endpoint)
            .map_err(|source| ProcessError::ClientInit {
                endpoint: endpoint.to_string(),
                source,
            })?;
        let conn = ConnectionGuard::new(conn);

        let content = std::fs::read(file_path).map_err(|source| ProcessError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %file_path.display(),
            bytes = content.len(),
            mime_type,
            "read document"
        );

        let request = ProcessRequest {
            name: reference.resource_name(),
            raw_document: RawDocument::new(content, mime_type)?,
        };

        let start = Instant::now();
        let response = match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!("cancelled while awaiting the service");
                    return Err(ProcessError::Cancelled);
                }
                resp = conn.process(&request) => resp,
            },
            None => conn.process(&request).await,
        }?;

        let result = ProcessingResult::from(response);
        tracing::info!(
            endpoint = %endpoint,
            chars = result.text().chars().count(),
            pages = result.document().pages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "document processed"
        );
        Ok(result)
    }
}

/// Write `Document Text: {text}` to `w`, without a trailing newline.
pub fn write_result<W: Write + ?Sized>(
    w: &mut W,
    result: &ProcessingResult,
) -> Result<(), ProcessError> {
    write!(w, "{}{}", OUTPUT_PREFIX, result.text()).map_err(ProcessError::Output)?;
    w.flush().map_err(ProcessError::Output)
}

impl std::fmt::Debug for DocumentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Send the file at `file_path` to
/// `projects/{project}/locations/{location}/processors/{processor}` and write
/// `Document Text: {text}` to `w`.
///
/// Uses [`RestConnector`] against `{location}-documentai.googleapis.com:443`
/// with ambient credentials. The connection is closed on every path.
pub async fn process_document<W: Write + ?Sized>(
    w: &mut W,
    project: &str,
    location: &str,
    processor: &str,
    file_path: impl AsRef<Path>,
    mime_type: &str,
) -> Result<(), ProcessError> {
    let reference = ProcessorReference::new(project, location, processor)?;
    DocumentProcessor::new(RestConnector::new())
        .process_to(w, &reference, file_path.as_ref(), mime_type)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::mock::{MockConnector, MockResponse};

    fn reference() -> ProcessorReference {
        ProcessorReference::new("my-proj", "us", "abc123").unwrap()
    }

    #[tokio::test]
    async fn writes_prefixed_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4 fake").unwrap();

        let connector = MockConnector::new(MockResponse::text("Hello, world"));
        let stats = connector.stats();
        let mut out = Vec::new();

        DocumentProcessor::new(connector)
            .process_to(&mut out, &reference(), file.path(), "application/pdf")
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Document Text: Hello, world");
        assert_eq!(stats.process_count(), 1);
        assert_eq!(stats.close_count(), 1);
    }

    #[tokio::test]
    async fn empty_file_is_rejected_before_sending() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let connector = MockConnector::new(MockResponse::text("unused"));
        let stats = connector.stats();

        let err = DocumentProcessor::new(connector)
            .process(&reference(), file.path(), "application/pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::EmptyDocument), "{err}");
        assert_eq!(stats.process_count(), 0);
        assert_eq!(stats.close_count(), 1);
    }

    #[tokio::test]
    async fn connect_failure_is_client_init() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let connector = MockConnector::failing_connect("no credentials");
        let stats = connector.stats();

        let err = DocumentProcessor::new(connector)
            .process(&reference(), file.path(), "application/pdf")
            .await
            .unwrap_err();

        match err {
            ProcessError::ClientInit { endpoint, .. } => {
                assert_eq!(endpoint, "us-documentai.googleapis.com:443");
            }
            other => panic!("expected ClientInit, got {other:?}"),
        }
        assert_eq!(stats.process_count(), 0);
        assert_eq!(stats.close_count(), 0);
    }

    struct FailingSink {
        fail_write: bool,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.fail_write {
                Err(std::io::Error::other("sink closed"))
            } else {
                Ok(buf.len())
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("flush failed"))
        }
    }

    fn result(text: &str) -> ProcessingResult {
        ProcessingResult::from(crate::document::ProcessResponse {
            document: Some(crate::document::Document {
                text: text.to_string(),
                ..Default::default()
            }),
        })
    }

    #[test]
    fn failing_write_is_output_error() {
        let err = write_result(&mut FailingSink { fail_write: true }, &result("hi")).unwrap_err();
        match err {
            ProcessError::Output(e) => assert_eq!(e.to_string(), "sink closed"),
            other => panic!("expected Output, got {other:?}"),
        }
    }

    #[test]
    fn failing_flush_is_output_error() {
        let err = write_result(&mut FailingSink { fail_write: false }, &result("hi")).unwrap_err();
        match err {
            ProcessError::Output(e) => assert_eq!(e.to_string(), "flush failed"),
            other => panic!("expected Output, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_reference_fails_before_connecting() {
        let mut out = Vec::new();
        let err = process_document(&mut out, "my-proj", "", "abc123", "x.pdf", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::InvalidReference(_)));
        assert!(out.is_empty());
    }
}
