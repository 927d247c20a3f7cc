//! Infrastructure adapters: HTTP collaborators and telemetry.

pub mod error;
pub mod http;
pub mod telemetry;
