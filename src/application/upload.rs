//! Image upload pipeline: capture at submission, insert on completion.
//!
//! The selection is captured when the file is submitted, not when the
//! network call resolves, because the user keeps editing while the upload
//! is pending. Concurrent uploads are independent; when their captures
//! overlap, completion order decides final document order.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::application::collaborators::{AssetStore, CollaboratorError, ImageFile};
use crate::application::session::{EditorSession, SessionEpoch};
use crate::domain::document::ImageAttrs;
use crate::domain::selection::Selection;

/// Where an upload will land once it resolves: the selection and session
/// lifetime observed when the file was submitted.
#[derive(Debug, Clone)]
pub struct SelectionCapture {
    pub epoch: SessionEpoch,
    pub selection: Selection,
}

impl SelectionCapture {
    pub fn of(session: &EditorSession) -> Self {
        Self {
            epoch: session.epoch(),
            selection: session.selection().clone(),
        }
    }
}

/// A resolved upload waiting to be applied to its session via
/// [`EditorSession::apply_upload`].
#[derive(Debug, Clone)]
pub struct PendingImage {
    pub attrs: ImageAttrs,
    pub capture: SelectionCapture,
}

/// Upload failure. Non-fatal: it aborts this one insertion and leaves the
/// document untouched.
#[derive(Debug, Error)]
#[error("image upload failed: {cause}")]
pub struct UploadError {
    #[source]
    pub cause: CollaboratorError,
}

/// Submits files to the asset store and turns successful uploads into
/// pending image insertions.
pub struct ImageUploadPipeline {
    store: Arc<dyn AssetStore>,
}

impl ImageUploadPipeline {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Upload `file`; the filename doubles as the image's alt text and
    /// title, matching what the console displays in its asset lists.
    pub async fn upload(
        &self,
        file: ImageFile,
        capture: SelectionCapture,
    ) -> Result<PendingImage, UploadError> {
        debug!(filename = %file.filename, "uploading image");
        let asset = self.store.store_image(&file).await.map_err(|cause| {
            warn!(filename = %file.filename, error = %cause, "image upload failed");
            UploadError { cause }
        })?;
        debug!(filename = %file.filename, url = %asset.url, "image stored");
        Ok(PendingImage {
            attrs: ImageAttrs {
                src: asset.url,
                alt: file.filename.clone(),
                title: file.filename,
            },
            capture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::collaborators::StoredAsset;
    use async_trait::async_trait;

    struct FixedStore {
        result: Result<StoredAsset, CollaboratorError>,
    }

    #[async_trait]
    impl AssetStore for FixedStore {
        async fn store_image(&self, _file: &ImageFile) -> Result<StoredAsset, CollaboratorError> {
            self.result.clone()
        }
    }

    fn file(name: &str) -> ImageFile {
        ImageFile {
            filename: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0u8; 16],
        }
    }

    fn capture() -> SelectionCapture {
        SelectionCapture::of(&EditorSession::new())
    }

    #[tokio::test]
    async fn successful_upload_names_the_image_after_the_file() {
        let pipeline = ImageUploadPipeline::new(Arc::new(FixedStore {
            result: Ok(StoredAsset {
                url: "https://cdn.example.com/photo.png".to_string(),
            }),
        }));

        let pending = pipeline
            .upload(file("photo.png"), capture())
            .await
            .expect("upload succeeds");
        assert_eq!(pending.attrs.src, "https://cdn.example.com/photo.png");
        assert_eq!(pending.attrs.alt, "photo.png");
        assert_eq!(pending.attrs.title, "photo.png");
    }

    #[tokio::test]
    async fn failed_upload_surfaces_the_cause() {
        let pipeline = ImageUploadPipeline::new(Arc::new(FixedStore {
            result: Err(CollaboratorError::Status { status: 500 }),
        }));

        let error = pipeline
            .upload(file("broken.png"), capture())
            .await
            .expect_err("upload fails");
        assert_eq!(error.cause, CollaboratorError::Status { status: 500 });
    }
}
