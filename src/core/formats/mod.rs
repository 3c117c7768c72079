// blocklog - core/formats/mod.rs
//
// One module per emitter. Each exposes plain functions that the classifier
// registry wraps as `ParseFn`s.

pub mod benchmark;
pub mod consensus;
