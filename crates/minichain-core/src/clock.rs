//! Time sources for block timestamps.

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

/// Supplies the textual capture-time instant stamped on each mined block.
pub trait Clock: Send + Sync {
    fn now(&self) -> String;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> String {
        (**self).now()
    }
}

/// Wall clock, rendered as UTC RFC 3339 with nanoseconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

/// Always returns the same instant. Makes mining replayable.
#[derive(Clone, Debug)]
pub struct FixedClock(pub String);

impl FixedClock {
    pub fn new(instant: impl Into<String>) -> Self {
        Self(instant.into())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}
