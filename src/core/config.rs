//! # Trigger configuration.
//!
//! Provides [`Config`], the settings a [`TriggerBuilder`](crate::TriggerBuilder)
//! applies when it builds a trigger.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`Config::bus_capacity_clamped`]

use std::borrow::Cow;

/// Per-trigger configuration.
///
/// ## Field semantics
/// - `name`: label attached to every event and log record of the trigger
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
#[derive(Clone, Debug)]
pub struct Config {
    /// Human-readable trigger name.
    pub name: Cow<'static, str>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = "trigger"`
    /// - `bus_capacity = 256`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("trigger"),
            bus_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(Config::default().bus_capacity_clamped(), 256);
    }
}
