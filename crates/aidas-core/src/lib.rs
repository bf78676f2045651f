//! # aidas-core
//!
//! Core types, traits, and abstractions for the aidas chat service.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other aidas crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod memory_cmd;
pub mod models;
pub mod sanitize;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use memory_cmd::{extract_memory_content, is_memory_command};
pub use models::*;
pub use sanitize::strip_html;
pub use traits::*;
