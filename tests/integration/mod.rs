//! Integration test suite for Vellum
//!
//! End-to-end tests against real template and cache directories: rendering
//! from files, artifact caching and staleness, and the `vellum` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **artifact_cache**: compile-once reuse, staleness, corrupt artifacts, cleanup
//! - **cli_commands**: `render`, `compile`, `check` and `clear`
//! - **render_files**: dotted names, suffixes and output writers

#[path = "../common/mod.rs"]
mod common;

mod artifact_cache;
mod cli_commands;
mod render_files;
