//! Crate-level tests.
//!
//! - `integration.rs`: end-to-end resolution and inspection through a session
//! - `properties.rs`: property tests of the walker, parameters and prompts
//! - `helpers.rs`: session factories and line lookups

mod helpers;
mod properties;

pub use helpers::*;
