//! Text artifacts generated from a resolved layout.
//!
//! Every renderer is a pure function from a [`Layout`](partman_core::Layout)
//! to a string; writing the result to disk is up to the caller.
//!
//! - [`header`]: linker override and aggregate `pm_config.h` headers
//! - [`kv`]: `KEY=value` lines for build systems

pub mod header;
pub mod kv;

pub use header::{header_guard, render_override, render_pm_config, HeaderOptions};
pub use kv::render_kv_config;
