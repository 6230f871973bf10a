//! Shared helpers for commands and the entry point

pub mod logging;
