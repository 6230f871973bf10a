//! Periodic reset detection
//!
//! [`schedule`] answers "when is the next/most recent reset"; [`tracker`]
//! decides, tick by tick, which occurrences fire and owns the refetch token.

pub mod ports;
pub mod schedule;
pub mod tracker;
