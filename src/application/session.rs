//! One editing session: command dispatch, snapshot history, and the
//! session lifetime marker that retires late async completions.

use tracing::debug;

use crate::application::upload::PendingImage;
use crate::domain::document::{Align, Document, ImageAttrs, MarkKind};
use crate::domain::draft::PostDraft;
use crate::domain::edits::{self, BlockType};
use crate::domain::format::{self, FormatState};
use crate::domain::selection::Selection;

/// Undo depth kept per session; the oldest snapshot drops off beyond this.
const MAX_UNDO_DEPTH: usize = 100;

/// Session lifetime marker. Async completions captured under an older
/// epoch are discarded instead of mutating a session they no longer
/// belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEpoch(u64);

/// A structural editing command. Dispatching commands is the only way the
/// document changes; undo/redo and selection moves never enter history.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleMark { mark: MarkKind },
    SetBlockType { block: BlockType },
    SetTextAlign { align: Align },
    InsertText { text: String },
    InsertHorizontalRule,
    InsertImage { image: ImageAttrs },
    SetLink { href: String },
    UnsetLink,
    ClearContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    /// The document model rejected the command; nothing changed and
    /// nothing was pushed onto history.
    Rejected,
}

/// What became of a finished upload handed back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadApplied {
    Inserted,
    /// The capture was stale; the document was left untouched and no
    /// error is surfaced.
    Discarded,
}

/// Host reply to a link prompt. The core never blocks on input: it hands
/// the current href to the host and consumes the reply here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkResponse {
    Cancelled,
    Submitted(String),
}

/// Owner of one [`PostDraft`], the current selection, and the undo/redo
/// stacks. Created when the post-creation view opens; [`reset`] stands in
/// for closing it.
///
/// [`reset`]: EditorSession::reset
pub struct EditorSession {
    draft: PostDraft,
    selection: Selection,
    undo_stack: Vec<Document>,
    redo_stack: Vec<Document>,
    epoch: SessionEpoch,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            draft: PostDraft::new(),
            selection: Selection::document_start(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            epoch: SessionEpoch(0),
        }
    }

    pub fn draft(&self) -> &PostDraft {
        &self.draft
    }

    /// Field-level draft access for title/slug/excerpt edits. These are
    /// not structural commands and do not touch history.
    pub fn draft_mut(&mut self) -> &mut PostDraft {
        &mut self.draft
    }

    pub fn document(&self) -> &Document {
        self.draft.content()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Move the selection. Pure navigation: never recorded in history.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    /// Toolbar projection for the current document and selection.
    pub fn format_state(&self) -> FormatState {
        format::resolve(self.document(), &self.selection)
    }

    /// Href under the selection, for pre-filling the host's link prompt.
    pub fn current_link_href(&self) -> Option<String> {
        edits::link_href_at(self.document(), &self.selection)
    }

    /// Apply the host's reply to a link prompt: cancel is a no-op, an
    /// empty submission removes the link, anything else sets it.
    pub fn apply_link_response(&mut self, response: LinkResponse) -> DispatchOutcome {
        match response {
            LinkResponse::Cancelled => DispatchOutcome::Rejected,
            LinkResponse::Submitted(href) if href.trim().is_empty() => {
                self.dispatch(Command::UnsetLink)
            }
            LinkResponse::Submitted(href) => self.dispatch(Command::SetLink { href }),
        }
    }

    /// Run one structural command against the current document.
    ///
    /// An applied command pushes the pre-command snapshot onto the undo
    /// stack and clears the redo stack; a rejected one leaves both alone.
    /// Clearing the content also clears history.
    pub fn dispatch(&mut self, command: Command) -> DispatchOutcome {
        let document = self.draft.content();
        let next = match &command {
            Command::ToggleMark { mark } => edits::toggle_mark(document, &self.selection, *mark),
            Command::SetBlockType { block } => {
                edits::set_block_type(document, &self.selection, *block)
            }
            Command::SetTextAlign { align } => {
                edits::set_text_align(document, &self.selection, *align)
            }
            Command::InsertText { text } => edits::insert_text(document, &self.selection, text),
            Command::InsertHorizontalRule => {
                edits::insert_horizontal_rule(document, &self.selection)
            }
            Command::InsertImage { image } => {
                edits::insert_image(document, &self.selection, image.clone())
            }
            Command::SetLink { href } => edits::set_link(document, &self.selection, href),
            Command::UnsetLink => edits::unset_link(document, &self.selection),
            Command::ClearContent => edits::clear_content(document),
        };
        let Some(next) = next else {
            debug!(?command, "command rejected as no-op");
            return DispatchOutcome::Rejected;
        };

        if matches!(command, Command::ClearContent) {
            self.undo_stack.clear();
            self.redo_stack.clear();
            self.selection = Selection::document_start();
        } else {
            self.push_undo(self.draft.content().clone());
            self.redo_stack.clear();
        }
        self.draft.set_content(next);
        debug!(?command, "command applied");
        DispatchOutcome::Applied
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Restore the most recent snapshot. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.draft.content().clone());
        self.draft.set_content(snapshot);
        debug!("undo");
        true
    }

    /// Mirror of [`undo`](EditorSession::undo).
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.draft.content().clone());
        self.draft.set_content(snapshot);
        debug!("redo");
        true
    }

    /// Apply a finished upload as an ordinary structural command.
    ///
    /// Completions captured under an older epoch are discarded silently.
    /// A captured selection the document no longer addresses falls back
    /// to the current cursor.
    pub fn apply_upload(&mut self, pending: PendingImage) -> UploadApplied {
        if pending.capture.epoch != self.epoch {
            debug!("discarding upload that outlived its session");
            return UploadApplied::Discarded;
        }
        let captured = pending.capture.selection;
        let selection = if self.document().node_at(&captured.focus.path).is_some() {
            captured
        } else {
            self.selection.clone()
        };
        let Some(next) = edits::insert_image(self.document(), &selection, pending.attrs) else {
            return UploadApplied::Discarded;
        };
        self.push_undo(self.draft.content().clone());
        self.redo_stack.clear();
        self.draft.set_content(next);
        debug!("upload applied as image insertion");
        UploadApplied::Inserted
    }

    /// Discard the draft and start a fresh lifetime; async work captured
    /// against the old one is orphaned by the epoch bump.
    pub fn reset(&mut self) {
        self.draft.reset();
        self.selection = Selection::document_start();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.epoch = SessionEpoch(self.epoch.0 + 1);
        debug!("session reset");
    }

    fn push_undo(&mut self, snapshot: Document) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > MAX_UNDO_DEPTH {
            self.undo_stack.remove(0);
        }
    }
}
