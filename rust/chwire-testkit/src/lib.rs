//! Test utilities for the chwire crates.
//!
//! - [`data_gen`]: random values, including the extremes of each numeric type
//! - [`chunks`]: splitting encoded bytes into chunks and replaying them

pub mod chunks;
pub mod data_gen;
