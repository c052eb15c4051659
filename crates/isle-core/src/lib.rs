//! Core abstractions shared by every Isle crate.
//!
//! This crate provides the fundamental types:
//! - `RequestContext` - Typed request parameters
//! - `RouteParams` - Parameters captured by a matched route
//! - `LifecyclePhase` / `TimingContext` - Request lifecycle tracking
//! - `IsleConfig` - Framework configuration (`isle.toml`)

mod config;
mod context;
mod lifecycle;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
