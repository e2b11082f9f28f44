//! Core types shared by every Vellum module.
//!
//! - [`ViewError`] - Enumerated failure modes of compiling and rendering
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format
//! - [`Context`] - The data context bound to a render

pub mod context;
pub mod error;

pub use context::Context;
pub use error::{ErrorContext, Result, ViewError, user_friendly_error};
