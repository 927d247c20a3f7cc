//! Ports to the external asset-store and persistence collaborators.
//!
//! The editor core never owns storage. Uploads and saves go through these
//! traits; production wires in the `reqwest` adapters from
//! [`crate::infra::http`], tests substitute in-memory doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::document::Document;

/// Binary image file handed to the upload pipeline by the host.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Successful upload result: where the asset is now publicly reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub url: String,
}

/// Wire body submitted to the persistence collaborator on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content_json: Document,
}

/// Transport-level failures shared by both collaborators. Any non-success
/// status is a failure; bodies are only read on success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator responded with status {status}")]
    Status { status: u16 },
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("malformed collaborator response: {message}")]
    MalformedResponse { message: String },
}

/// Asset storage service accepting image uploads.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store the image and return its public URL.
    async fn store_image(&self, file: &ImageFile) -> Result<StoredAsset, CollaboratorError>;
}

/// Persistence service accepting finished post drafts.
#[async_trait]
pub trait PostGateway: Send + Sync {
    /// Persist a validated post payload.
    async fn submit_post(&self, payload: &PostPayload) -> Result<(), CollaboratorError>;
}
