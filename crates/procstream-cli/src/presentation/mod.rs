//! Shared CLI presentation utilities.
//!
//! Format-only helpers; no domain transforms.

pub mod tables;

pub use tables::{format_bytes, format_optional, format_uptime, print_separator, truncate_string};
