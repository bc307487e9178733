//! Error types for the connector library

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the AM-Vision API client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid AM-Vision URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("AM-Vision rejected {method} {url} ({status}): {body}")]
    Client {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("AM-Vision failed {method} {url} ({status}): {body}")]
    Server {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of the failed response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Client { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors that abort an import run
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read metadata file {path:?}: {source}")]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse metadata file {path:?}: {source}")]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to read model file {path:?}: {source}")]
    ModelFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("design reference {0} exists without a design")]
    DesignMissing(String),

    #[error("material reference {0} is unknown to AM-Vision")]
    UnknownMaterial(String),

    #[error("no design material returned for design {design} and material {material}")]
    UnknownDesignMaterial { design: String, material: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors raised while registering webhook handlers
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to register webhook for {event}: {source}")]
    Registration {
        event: String,
        #[source]
        source: ApiError,
    },
}
