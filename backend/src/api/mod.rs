//! HTTP API module.
//!
//! Serves a loaded dataset to the browser visualizations, plus the log
//! stream used by the loader.

pub mod server;
pub mod types;
pub mod logs;

pub use server::{router, start_server, AppState};
pub use types::*;
pub use logs::*;
