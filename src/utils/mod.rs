//! Utility functions and helpers
//!
//! This module provides locator validation used before any download starts.

pub mod uri;

// Re-export commonly used utilities
pub use uri::*;
