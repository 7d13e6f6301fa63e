//! Deterministic, pure logic shared by the engine.
//!
//! Core modules are free of clocks, I/O and id generation. They operate on an
//! in-memory [`Tree`](crate::tree::Tree) and return deterministic outputs
//! suitable for tests.

pub mod enforcement;
pub mod frontier;
pub mod guide;
pub mod invariants;
pub mod levels;
pub mod path;
pub mod scoring;
pub mod types;
