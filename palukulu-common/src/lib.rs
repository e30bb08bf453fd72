//! # Palukulu Common Library
//!
//! Shared code for the Palukulu services including:
//! - Bootstrap configuration and root folder resolution
//! - Database pool setup and schema creation
//! - Contribution data records (users, proverbs, tongue twisters)
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
