// Filmgraph - social film cataloguing service.
// Friendship graph and popularity engine over pluggable storage backends.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use error::{AppError, AppResult};
