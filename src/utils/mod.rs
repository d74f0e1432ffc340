//! Utility functions
//!
//! Provides byte-size formatting and logging setup.

pub mod format;
pub mod logging;

pub use format::{format_bytes, parse_size};
