//! Contact input schema
//!
//! Upstream contact records arrive with several spellings of the same fields.
//! This module accepts those variants and resolves them into the single
//! [`ContactEngagementRecord`](crate::types::ContactEngagementRecord) shape the
//! scorers consume.

mod adapter;
mod raw_contact;

pub use adapter::*;
pub use raw_contact::*;
