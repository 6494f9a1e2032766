//! # Realtime Core
//!
//! Errors and external interfaces shared by the live fleet crates.

mod error;
mod provider;

pub use crate::error::*;
pub use crate::provider::*;
