//! Rinkside Core - Shared types library.
//!
//! This crate provides common types used across all Rinkside components:
//! - `api` - The marketplace REST API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, prices, buyers, and card enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
