//! Application services layer: the editing session, validation, and the
//! asynchronous upload/save flows.

pub mod collaborators;
pub mod save;
pub mod session;
pub mod upload;
pub mod validate;
