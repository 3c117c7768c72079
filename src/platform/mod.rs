// blocklog - platform/mod.rs
//
// Platform abstraction layer: config location and loading, file helpers.
// Dependencies: standard library, directories, toml; core types for validation.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
