//! Host-side persistence.

pub mod config;
