//! Core types for Rinkside.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod buyer;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use buyer::Buyer;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{FeeSplit, PLATFORM_FEE_PERCENT, PriceError};
pub use status::*;
