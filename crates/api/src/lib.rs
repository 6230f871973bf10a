//! # Questline App
//!
//! Application layer - commands and main entry point.
//!
//! This crate contains:
//! - Commands (view → backend bridge)
//! - Application context (dependency injection)
//! - The in-process navigator the invalidation cascade drives
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod navigation;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
