//! Session ports

pub mod ports;
