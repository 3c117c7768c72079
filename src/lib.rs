// blocklog - lib.rs
//
// Library entry point. The `blocklog` binary in `main.rs` is a thin CLI over
// `app::pipeline`; integration tests drive the same modules directly.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
