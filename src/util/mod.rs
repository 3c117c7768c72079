// blocklog - util/mod.rs
//
// Utility modules: error types, named constants, logging setup, duration
// literals. No dependencies on core, app, or platform layers.

pub mod constants;
pub mod duration;
pub mod error;
pub mod logging;
