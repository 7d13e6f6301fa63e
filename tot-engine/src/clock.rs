//! Time source abstraction.
//!
//! Elapsed time is read synchronously whenever a status is computed; there is
//! no background timer. Tests swap in a manual clock to cross deadlines
//! without sleeping.

use std::time::Instant;

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    /// Monotonic instant used for elapsed-time accounting.
    fn now(&self) -> Instant;

    /// Wall-clock time used only for display timestamps.
    fn wall(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
