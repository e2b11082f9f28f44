//! Vellum - a directive-based template engine
//!
//! Vellum compiles templates written with `@directives` and `{{ echoes }}`
//! into cached programs and renders them with named data, supporting
//! layout inheritance, named blocks and includes.
//!
//! # Architecture Overview
//!
//! - Template sources are addressed by logical dotted names (`pages.home`
//!   resolves to `<views>/pages/home.tpl.html`)
//! - Sources compile to a [`compiler::Program`] which is cached on disk,
//!   keyed by the SHA-256 of the name and invalidated by modification time
//! - A [`render::BlockRenderer`] executes programs, collecting named blocks
//!   and walking each template's `@extends` chain
//!
//! # Core Modules
//!
//! - [`compiler`] - comment, directive and echo passes plus the artifact cache
//! - [`render`] - block store, inheritance, includes and the program executor
//! - [`expr`] - the expression language used by echoes and directives
//! - [`store`] - source and artifact stores (filesystem and in-memory)
//! - [`config`] - `vellum.toml` configuration and environment overrides
//! - [`core`] - render data and the error type
//! - [`cli`] - the `vellum` command-line interface
//! - [`utils`] - filesystem helpers
//!
//! # Template Syntax
//!
//! ```text
//! @extends('layouts.app')
//!
//! @section('title', 'Orders')
//!
//! @section('body')
//!   {{-- comments are dropped --}}
//!   <h1>Hello, {{ $user or 'Guest' }}</h1>
//!   @foreach($orders as $order)
//!     @if($order['paid'])
//!       <p>{{ $order['id'] }} paid</p>
//!     @else
//!       <p>{!! $order['note'] !!}</p>
//!     @endif
//!   @endforeach
//!   @include('partials.footer')
//! @stop
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use vellum::config::ViewConfig;
//! use vellum::core::Context;
//! use vellum::render::BlockRenderer;
//!
//! let renderer = BlockRenderer::from_config(ViewConfig::default())?;
//! let mut data = Context::new();
//! data.insert("user", "Ada");
//! let html = renderer.render("pages.home", &data)?;
//! # Ok::<(), vellum::core::ViewError>(())
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! vellum render pages.home --data home.json
//! vellum compile layouts.app --print
//! vellum check pages.home
//! vellum clear
//! ```

// Engine
pub mod compiler;
pub mod expr;
pub mod render;

// Storage and configuration
pub mod config;
pub mod core;
pub mod store;

// Supporting modules
pub mod cli;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
