//! Shared helpers.
//!
//! - [`fs`] - atomic writes and modification-time lookups used by the stores

pub mod fs;

pub use fs::{atomic_write, ensure_dir, modified_time};
