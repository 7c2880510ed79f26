//! Tickscript Core - Shared error type and host render primitives

mod error;
mod types;

pub use error::*;
pub use types::*;
