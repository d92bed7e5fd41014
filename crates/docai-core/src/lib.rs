use std::path::PathBuf;

use thiserror::Error;

pub mod config_file;
pub mod connection;
pub mod credentials;
pub mod document;
pub mod facade;
pub mod resource;

// Re-export for convenience
pub use connection::{ConnectError, Connection, Connector, RemoteError, RestConnector};
pub use credentials::{Credentials, CredentialsError};
pub use document::{Document, Entity, Page, ProcessRequest, ProcessingResult, RawDocument};
pub use facade::{DocumentProcessor, OUTPUT_PREFIX, process_document, write_result};
pub use resource::{Endpoint, ProcessorReference};

/// Everything that can stop a process call. The first error encountered
/// aborts the remaining steps; nothing is retried.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("invalid processor reference: {0}")]
    InvalidReference(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document is empty")]
    EmptyDocument,
    #[error("error creating Document AI client for {endpoint}: {source}")]
    ClientInit {
        endpoint: String,
        #[source]
        source: ConnectError,
    },
    #[error("Document AI request failed: {0}")]
    RemoteService(#[from] RemoteError),
    #[error("request cancelled")]
    Cancelled,
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}
