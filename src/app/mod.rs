// blocklog - app/mod.rs
//
// Application layer: run orchestration.
// Dependencies: core and platform layers.

pub mod pipeline;
