//! Reputation score lookups for visited sites.
//!
//! Domains are looked up in a durable cache first and fetched from the scoring
//! API on a miss; the result drives the toolbar icon of the tab.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod presentation;
pub mod state;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
