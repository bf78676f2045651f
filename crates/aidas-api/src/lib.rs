//! aidas-api - HTTP server for the aidas chat service.
//!
//! Routes, session auth, and the streaming turn pipeline. Handlers are kept
//! thin; the pipeline itself lives in [`turn`] and operates purely on the
//! repository traits so it can be exercised against in-memory fakes.

pub mod admin;
pub mod analyze;
pub mod auth;
pub mod conversations;
pub mod error;
pub mod retention;
pub mod search;
pub mod state;
pub mod title;
pub mod turn;
pub mod upload;

pub use error::ApiError;
pub use state::{AppState, Repos};
