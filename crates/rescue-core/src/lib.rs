//! Core types and definitions for the rescue tracking engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! coordinates, session identity, configuration, errors, poll records,
//! per-tick output views, and events. It has no runtime dependency.

pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

pub use error::TrackError;
