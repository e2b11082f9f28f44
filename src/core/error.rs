//! Error handling for Vellum
//!
//! This module provides the error type shared by the compiler, the renderer and
//! the stores, plus user-friendly error reporting for the CLI. It follows two
//! principles:
//! 1. **Strongly-typed errors** so callers can match on the failure mode
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Resolution**: [`ViewError::TemplateNotFound`], [`ViewError::InvalidTemplateName`]
//! - **Compilation**: [`ViewError::MalformedDirective`], [`ViewError::ExpressionSyntax`]
//! - **Execution**: [`ViewError::UndefinedVariable`], [`ViewError::Evaluation`],
//!   [`ViewError::LoopLimitExceeded`]
//! - **Blocks and inheritance**: [`ViewError::BlockReadWhileOpen`],
//!   [`ViewError::UnbalancedEnd`], [`ViewError::UnclosedBlock`],
//!   [`ViewError::InheritanceCycle`], [`ViewError::DepthExceeded`]
//! - **Storage**: [`ViewError::CacheWriteFailure`], [`ViewError::CacheReadFailure`],
//!   [`ViewError::SourceReadFailure`]
//!
//! Every variant is fatal to the render that produced it. The renderer buffers
//! all output, so a failed render never hands partial text to its caller.
//!
//! # Examples
//!
//! ```rust,no_run
//! use vellum::core::{ViewError, user_friendly_error};
//!
//! let err = ViewError::InheritanceCycle {
//!     chain: vec!["page".into(), "layout".into(), "page".into()],
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T, E = ViewError> = std::result::Result<T, E>;

/// The main error type for Vellum operations.
#[derive(Error, Debug)]
pub enum ViewError {
    /// The logical template name does not resolve to a readable source.
    #[error("Template '{name}' not found (looked for {})", path.display())]
    TemplateNotFound {
        /// Logical template name as requested
        name: String,
        /// Resolved location that was attempted
        path: PathBuf,
    },

    /// The logical name cannot be mapped to a location safely.
    #[error("Invalid template name '{name}': {reason}")]
    InvalidTemplateName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// A directive could not be compiled or closes a block that is not open.
    ///
    /// Raised for unbalanced argument parentheses, missing or unexpected
    /// arguments, mismatched `@end*` directives and block operations that do
    /// not match the open block stack.
    #[error("Malformed directive in '{template}' at line {line}: {message}")]
    MalformedDirective {
        /// Template being compiled or executed
        template: String,
        /// 1-based source line
        line: usize,
        /// What went wrong
        message: String,
    },

    /// An echo or directive argument is not a valid expression.
    #[error("Syntax error in '{template}' at line {line}: {message}")]
    ExpressionSyntax {
        /// Template being compiled
        template: String,
        /// 1-based source line
        line: usize,
        /// Parser message
        message: String,
    },

    /// An expression referenced a variable missing from the data context.
    #[error("Undefined variable '${variable}' in '{template}' at line {line}")]
    UndefinedVariable {
        /// Template being executed
        template: String,
        /// 1-based source line
        line: usize,
        /// Variable name without the `$` sigil
        variable: String,
        /// Similar names that are defined
        suggestions: Vec<String>,
    },

    /// An expression failed while being evaluated.
    #[error("Evaluation failed in '{template}' at line {line}: {message}")]
    Evaluation {
        /// Template being executed
        template: String,
        /// 1-based source line
        line: usize,
        /// What went wrong
        message: String,
    },

    /// A loop ran longer than the configured iteration limit.
    #[error("Loop in '{template}' at line {line} exceeded {limit} iterations")]
    LoopLimitExceeded {
        /// Template being executed
        template: String,
        /// 1-based source line of the loop header
        line: usize,
        /// Configured limit
        limit: usize,
    },

    /// A block was read while it was still open (strict mode only).
    #[error("Block '{name}' was read while it is still open")]
    BlockReadWhileOpen {
        /// Name of the open block
        name: String,
    },

    /// `end()` was called with no open block.
    #[error("No open block to end")]
    UnbalancedEnd,

    /// A template finished executing with a section still open.
    #[error("Template '{template}' left section '{name}' open")]
    UnclosedBlock {
        /// Template that left the block open
        template: String,
        /// Name of the open block
        name: String,
    },

    /// A parent chain revisited a template.
    #[error("Circular template inheritance: {}", chain.join(" -> "))]
    InheritanceCycle {
        /// Template names in the order they were reached
        chain: Vec<String>,
    },

    /// An include or inheritance chain grew beyond its limit.
    #[error("{kind} depth limit of {limit} exceeded at '{template}'")]
    DepthExceeded {
        /// `include` or `inheritance`
        kind: &'static str,
        /// Configured limit
        limit: usize,
        /// Template that would have exceeded it
        template: String,
    },

    /// The artifact store could not persist a compiled template.
    #[error("Failed to write compiled artifact '{key}' to {}", path.display())]
    CacheWriteFailure {
        /// Artifact key
        key: String,
        /// Location that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The artifact store could not be read or cleared.
    #[error("Failed to access compiled artifact store at {}", path.display())]
    CacheReadFailure {
        /// Location that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A template source exists but could not be read.
    #[error("Failed to read template source {}", path.display())]
    SourceReadFailure {
        /// Location that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A compiled program could not be serialized.
    #[error("Failed to encode compiled artifact for '{template}'")]
    ArtifactEncoding {
        /// Template being compiled
        template: String,
        /// Serializer error
        #[source]
        source: serde_json::Error,
    },

    /// Writing rendered output to the caller's sink failed.
    #[error("Failed to write rendered output")]
    Output {
        #[source]
        source: std::io::Error,
    },

    /// Configuration values are inconsistent.
    #[error("Configuration error: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },
}

impl ViewError {
    /// Name of the template the error is attributed to, if any.
    pub fn template(&self) -> Option<&str> {
        match self {
            Self::TemplateNotFound {
                name,
                ..
            }
            | Self::InvalidTemplateName {
                name,
                ..
            } => Some(name),
            Self::MalformedDirective {
                template,
                ..
            }
            | Self::ExpressionSyntax {
                template,
                ..
            }
            | Self::UndefinedVariable {
                template,
                ..
            }
            | Self::Evaluation {
                template,
                ..
            }
            | Self::LoopLimitExceeded {
                template,
                ..
            }
            | Self::UnclosedBlock {
                template,
                ..
            }
            | Self::DepthExceeded {
                template,
                ..
            }
            | Self::ArtifactEncoding {
                template,
                ..
            } => Some(template),
            _ => None,
        }
    }
}

/// Error wrapper that adds user-facing details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        for cause in self.error.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with suggestions for known failures.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let Some(view_error) = error.downcast_ref::<ViewError>() else {
        return ErrorContext::new(error);
    };

    match view_error {
        ViewError::TemplateNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the template name, the views directory and the configured suffix")
            .with_details("Names use dot notation: 'layouts.main' maps to views/layouts/main<suffix>"),
        ViewError::InvalidTemplateName {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Use a relative dot-separated name without '..' segments"),
        ViewError::MalformedDirective {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Check that every @if/@foreach/@section has a matching end directive and balanced parentheses",
        ),
        ViewError::ExpressionSyntax {
            ..
        } => ErrorContext::new(error)
            .with_details("Expressions use $variables, literals, operators and function calls"),
        ViewError::UndefinedVariable {
            suggestions,
            ..
        } => {
            let suggestion = if suggestions.is_empty() {
                "Pass the variable in the data context or use `{{ $name or 'default' }}`"
                    .to_string()
            } else {
                let names: Vec<String> = suggestions.iter().map(|s| format!("${s}")).collect();
                format!("Did you mean {}?", names.join(", "))
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        ViewError::InheritanceCycle {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove the @extends that points back into the chain"),
        ViewError::UnclosedBlock {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Close the section with @endsection, @show, @stop, @append or @overwrite"),
        ViewError::CacheWriteFailure {
            ..
        }
        | ViewError::CacheReadFailure {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that the cache directory exists and is writable")
            .with_details("Compiled templates are never served stale; the render was aborted"),
        _ => ErrorContext::new(error),
    }
}
