//! services/archive/src/lib.rs
//!
//! The archive service: storage adapters, configuration, and the HTTP layer
//! around `archive_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
