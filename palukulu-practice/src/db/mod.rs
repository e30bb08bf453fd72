//! Database access for palukulu-practice
//!
//! Schema creation lives in `palukulu_common::db`; this module holds the
//! queries this service issues.

pub mod contributions;
pub mod retry;

pub use retry::retry_on_lock;
