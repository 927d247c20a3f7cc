//! Pressbox editor core: the structured post editor behind a gaming-news
//! admin console.
//!
//! The crate covers the document model and its structural commands,
//! snapshot-based undo/redo, toolbar format resolution, slug derivation,
//! the asynchronous image-upload pipeline, and the validate-then-save
//! coordinator. Hosting concerns (routing, rendering, auth, persistence)
//! live with the console and its services; the core talks to them through
//! the collaborator ports in [`application::collaborators`].

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
