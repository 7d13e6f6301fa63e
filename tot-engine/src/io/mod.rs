//! Side-effecting boundaries: configuration files, replay scripts, reports.

pub mod config;
pub mod report;
pub mod script;
