//! Tree-of-thought exploration engine.
//!
//! A caller proposes candidate thoughts with progress, feasibility and risk
//! estimates; the engine scores them, keeps a bounded search tree per run,
//! decides which nodes to expand next, prunes weak branches and returns the
//! path whose weakest step is strongest.
//!
//! - **[`core`]**: Pure, deterministic logic (levels, scoring, frontier
//!   selection, enforcement, path selection, invariants).
//! - **[`io`]**: Configuration files, replay scripts and report rendering.
//!
//! [`registry::Registry`] owns every run and exposes the engine operations;
//! [`replay`] drives a registry from a script for the CLI.

pub mod clock;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod registry;
pub mod replay;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;

pub use error::{EngineError, Result};
pub use registry::Registry;
