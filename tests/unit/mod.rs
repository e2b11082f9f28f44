//! Unit test suite for Vellum
//!
//! Exercises the public engine API against in-memory stores: echo forms,
//! control flow, blocks and inheritance, and error reporting.
//!
//! # Running Unit Tests
//!
//! ```bash
//! cargo test --test unit
//! ```

#[path = "../common/mod.rs"]
mod common;

mod blocks;
mod control_flow;
mod echoes;
mod errors;
