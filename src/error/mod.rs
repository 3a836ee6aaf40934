//! Error taxonomy for the page manager.

mod types;

pub use types::{NavError, Result};
