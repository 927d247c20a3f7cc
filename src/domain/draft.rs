//! The in-progress post record and its auto-slug latch.

use crate::domain::document::Document;
use crate::domain::slug::derive_slug;

/// Draft of a post being authored: the metadata fields plus the content
/// tree. A draft is owned by exactly one editing session and mutated only
/// through these methods, so the auto-slug latch cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    title: String,
    slug: String,
    excerpt: String,
    content: Document,
    auto_slug: bool,
}

impl Default for PostDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            slug: String::new(),
            excerpt: String::new(),
            content: Document::empty(),
            auto_slug: true,
        }
    }
}

impl PostDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    pub fn content(&self) -> &Document {
        &self.content
    }

    pub fn auto_slug(&self) -> bool {
        self.auto_slug
    }

    /// Update the title, re-deriving the slug while auto-derivation is
    /// enabled.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        if self.auto_slug {
            self.slug = derive_slug(&self.title);
        }
    }

    /// Manually edit the slug. The first manual edit latches auto
    /// derivation off; only [`PostDraft::set_auto_slug`] turns it back on.
    pub fn edit_slug(&mut self, slug: impl Into<String>) {
        self.auto_slug = false;
        self.slug = slug.into();
    }

    pub fn set_excerpt(&mut self, excerpt: impl Into<String>) {
        self.excerpt = excerpt.into();
    }

    /// Flip the auto-slug switch. Re-enabling immediately re-derives the
    /// slug from the current title.
    pub fn set_auto_slug(&mut self, enabled: bool) {
        self.auto_slug = enabled;
        if enabled {
            self.slug = derive_slug(&self.title);
        }
    }

    pub(crate) fn set_content(&mut self, content: Document) {
        self.content = content;
    }

    /// Return the draft to its pristine state, auto-slug re-enabled.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
