//! `reqwest` adapters for the upload and persistence collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::application::collaborators::{
    AssetStore, CollaboratorError, ImageFile, PostGateway, PostPayload, StoredAsset,
};
use crate::infra::error::InfraError;

/// Success body of the upload contract.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, InfraError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| InfraError::configuration(format!("failed to build http client: {err}")))
}

fn transport(err: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Transport {
        message: err.to_string(),
    }
}

/// Asset-store adapter: multipart `POST` with a single `file` field.
pub struct HttpAssetStore {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpAssetStore {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, InfraError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn store_image(&self, file: &ImageFile) -> Result<StoredAsset, CollaboratorError> {
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type).map_err(transport)?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
            });
        }
        let body: UploadResponse =
            response
                .json()
                .await
                .map_err(|err| CollaboratorError::MalformedResponse {
                    message: err.to_string(),
                })?;
        debug!(url = %body.url, "asset stored");
        Ok(StoredAsset { url: body.url })
    }
}

/// Persistence adapter: JSON `POST` of the serialized draft payload.
pub struct HttpPostGateway {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpPostGateway {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, InfraError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }
}

#[async_trait]
impl PostGateway for HttpPostGateway {
    async fn submit_post(&self, payload: &PostPayload) -> Result<(), CollaboratorError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
            });
        }
        debug!(slug = %payload.slug, "post submitted");
        Ok(())
    }
}
