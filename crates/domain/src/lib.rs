//! # Questline Domain
//!
//! Domain types shared by every Questline crate.
//!
//! This crate contains:
//! - Session and token types exchanged with the API
//! - Reset kinds and the published reset status
//! - Configuration structures
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other Questline crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
