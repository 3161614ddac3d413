//! Foundation types for sitenav.
//!
//! This crate holds the error type shared by the site layer, the browser
//! core and the desktop entry point.

pub mod error;

pub use error::{Result, SitenavError};
