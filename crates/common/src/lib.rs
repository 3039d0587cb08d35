//! Shared types for the Instagram auth workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
