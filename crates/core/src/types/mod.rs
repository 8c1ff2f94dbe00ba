//! Core types for the catalog.
//!
//! This module provides type-safe wrappers for entity identities.

pub mod id;

pub use id::*;
