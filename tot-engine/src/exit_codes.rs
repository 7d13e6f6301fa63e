//! Stable exit codes for `tot-engine` commands.

/// Command succeeded; for `replay`, a best path was returned.
pub const OK: i32 = 0;
/// Invalid arguments, config, script or any other error.
pub const INVALID: i32 = 1;
/// `replay` requested a gated answer before enforcement was complete.
pub const ENFORCEMENT_NOT_MET: i32 = 2;
