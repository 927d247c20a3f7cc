//! Save coordination: duplicate-submit guard, validate, serialize, submit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};

use crate::application::collaborators::{CollaboratorError, PostGateway, PostPayload};
use crate::application::validate::{self, ValidationError};
use crate::domain::draft::PostDraft;

/// Save failure. The draft is left intact; retrying is just calling
/// [`SaveCoordinator::save`] again.
#[derive(Debug, Error)]
#[error("saving post failed: {cause}")]
pub struct SaveError {
    #[source]
    pub cause: CollaboratorError,
}

/// Outcome of one save attempt.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The draft was persisted. Fields and content stay populated until
    /// the user explicitly clears them.
    Saved,
    /// Another save was already pending; this attempt did nothing.
    AlreadySaving,
    /// Validation rejected the draft before any network call was made.
    Invalid(ValidationError),
    /// The collaborator rejected or never received the submission.
    Failed(SaveError),
}

/// Serializes validated drafts and submits them to the persistence
/// collaborator, one at a time.
///
/// The `saving` flag is the only mutual exclusion in the editor: document
/// mutation is synchronous and needs none, but save attempts must be
/// serialized so a double-clicked save button cannot submit twice.
pub struct SaveCoordinator {
    gateway: Arc<dyn PostGateway>,
    saving: AtomicBool,
}

impl SaveCoordinator {
    pub fn new(gateway: Arc<dyn PostGateway>) -> Self {
        Self {
            gateway,
            saving: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently pending.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    /// Run one save attempt for `draft`.
    pub async fn save(&self, draft: &PostDraft) -> SaveOutcome {
        if self.is_saving() {
            return SaveOutcome::AlreadySaving;
        }
        let valid = match validate::validate(draft) {
            Ok(valid) => valid,
            Err(error) => {
                warn!(field = %error.field, "draft rejected before save");
                return SaveOutcome::Invalid(error);
            }
        };
        let Some(_guard) = SavingGuard::engage(&self.saving) else {
            return SaveOutcome::AlreadySaving;
        };

        let payload = PostPayload {
            title: valid.title,
            slug: valid.slug,
            excerpt: valid.excerpt,
            content_json: valid.content,
        };
        match self.gateway.submit_post(&payload).await {
            Ok(()) => {
                info!(slug = %payload.slug, "post saved");
                SaveOutcome::Saved
            }
            Err(cause) => {
                warn!(slug = %payload.slug, error = %cause, "post save failed");
                SaveOutcome::Failed(SaveError { cause })
            }
        }
    }
}

/// Holds the saving flag for the duration of one submission; dropping it
/// resets the flag no matter how the submission ended.
struct SavingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SavingGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Option<Self> {
        (!flag.swap(true, Ordering::SeqCst)).then_some(Self { flag })
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::validate::DraftField;
    use crate::domain::document::{Document, Node};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn valid_draft() -> PostDraft {
        let mut draft = PostDraft::new();
        draft.set_title("GTA 6 pode ser adiado");
        draft.set_excerpt("Rumores apontam novo adiamento.");
        draft.set_content(
            Document::from_blocks(vec![Node::paragraph(vec![Node::text("corpo")])])
                .expect("valid document"),
        );
        draft
    }

    /// Gateway that blocks until released, so tests can observe the
    /// pending state deterministically.
    struct HeldGateway {
        submissions: AtomicUsize,
        started: Notify,
        release: Notify,
        result: Result<(), CollaboratorError>,
    }

    impl HeldGateway {
        fn new(result: Result<(), CollaboratorError>) -> Arc<Self> {
            Arc::new(Self {
                submissions: AtomicUsize::new(0),
                started: Notify::new(),
                release: Notify::new(),
                result,
            })
        }
    }

    #[async_trait]
    impl PostGateway for HeldGateway {
        async fn submit_post(&self, _payload: &PostPayload) -> Result<(), CollaboratorError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            self.result.clone()
        }
    }

    /// Gateway that answers immediately.
    struct InstantGateway {
        submissions: AtomicUsize,
        result: Result<(), CollaboratorError>,
    }

    #[async_trait]
    impl PostGateway for InstantGateway {
        async fn submit_post(&self, _payload: &PostPayload) -> Result<(), CollaboratorError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_gateway() {
        let gateway = Arc::new(InstantGateway {
            submissions: AtomicUsize::new(0),
            result: Ok(()),
        });
        let coordinator = SaveCoordinator::new(gateway.clone());

        let outcome = coordinator.save(&PostDraft::new()).await;
        match outcome {
            SaveOutcome::Invalid(error) => assert_eq!(error.field, DraftField::Title),
            other => panic!("expected validation rejection, got {other:?}"),
        }
        assert_eq!(gateway.submissions.load(Ordering::SeqCst), 0);
        assert!(!coordinator.is_saving());
    }

    #[tokio::test]
    async fn successful_save_resets_the_flag_and_keeps_the_draft() {
        let gateway = Arc::new(InstantGateway {
            submissions: AtomicUsize::new(0),
            result: Ok(()),
        });
        let coordinator = SaveCoordinator::new(gateway.clone());
        let draft = valid_draft();

        let outcome = coordinator.save(&draft).await;
        assert!(matches!(outcome, SaveOutcome::Saved));
        assert_eq!(gateway.submissions.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_saving());
        assert_eq!(draft.title(), "GTA 6 pode ser adiado");
    }

    #[tokio::test]
    async fn second_save_while_pending_is_a_no_op() {
        let gateway = HeldGateway::new(Ok(()));
        let coordinator = Arc::new(SaveCoordinator::new(gateway.clone()));
        let draft = valid_draft();

        let first = {
            let coordinator = coordinator.clone();
            let draft = draft.clone();
            tokio::spawn(async move { coordinator.save(&draft).await })
        };
        gateway.started.notified().await;
        assert!(coordinator.is_saving());

        let second = coordinator.save(&draft).await;
        assert!(matches!(second, SaveOutcome::AlreadySaving));

        gateway.release.notify_one();
        let first = first.await.expect("save task completes");
        assert!(matches!(first, SaveOutcome::Saved));
        assert_eq!(gateway.submissions.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_saving());
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_and_allows_retry() {
        let gateway = Arc::new(InstantGateway {
            submissions: AtomicUsize::new(0),
            result: Err(CollaboratorError::Status { status: 502 }),
        });
        let coordinator = SaveCoordinator::new(gateway.clone());
        let draft = valid_draft();

        let outcome = coordinator.save(&draft).await;
        match outcome {
            SaveOutcome::Failed(error) => {
                assert_eq!(error.cause, CollaboratorError::Status { status: 502 });
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!coordinator.is_saving());

        // The flag was reset, so a retry reaches the gateway again.
        let retry = coordinator.save(&draft).await;
        assert!(matches!(retry, SaveOutcome::Failed(_)));
        assert_eq!(gateway.submissions.load(Ordering::SeqCst), 2);
    }
}
