//! Pre-save draft validation.
//!
//! Rules run in a fixed order (title, slug, excerpt, content) and stop
//! at the first failure, so the console surfaces one message at a time
//! the way its form does.

use std::fmt;

use thiserror::Error;

use crate::domain::document::{Document, Node};
use crate::domain::draft::PostDraft;

/// Field a validation failure points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Slug,
    Excerpt,
    Content,
}

impl DraftField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Slug => "slug",
            Self::Excerpt => "excerpt",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blocks a save. Fully recoverable; document state is never touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: DraftField,
    pub message: &'static str,
}

/// A draft that passed validation, with its text fields trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: Document,
}

/// Validate `draft` for submission.
pub fn validate(draft: &PostDraft) -> Result<ValidDraft, ValidationError> {
    let title = require_text(draft.title(), DraftField::Title, "title must not be empty")?;
    let slug = require_text(draft.slug(), DraftField::Slug, "slug must not be empty")?;
    let excerpt = require_text(
        draft.excerpt(),
        DraftField::Excerpt,
        "excerpt must not be empty",
    )?;
    if !has_publishable_content(draft.content()) {
        return Err(ValidationError {
            field: DraftField::Content,
            message: "content must contain at least one non-empty block",
        });
    }
    Ok(ValidDraft {
        title,
        slug,
        excerpt,
        content: draft.content().clone(),
    })
}

fn require_text(
    value: &str,
    field: DraftField,
    message: &'static str,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError { field, message });
    }
    Ok(trimmed.to_string())
}

fn has_publishable_content(document: &Document) -> bool {
    document.blocks().iter().any(Node::has_visible_content)
}
