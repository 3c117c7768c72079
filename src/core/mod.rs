// blocklog - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library plus data crates (chrono, regex, csv, serde).
// Must NOT depend on: platform, app, or open files itself.

pub mod export;
pub mod filter;
pub mod formats;
pub mod model;
pub mod parser;
pub mod registry;
