//! Satellite registry records and telemetry snapshots.

use std::time::Duration;

use tokio::time::Instant;

use crate::codec::{get_float, Value};

/// One discovered satellite.
///
/// Liveness runs `active -> inactive` when the monitor sees no valid frame
/// for longer than the timeout, and back to `active` on the next valid
/// frame.
#[derive(Debug, Clone)]
pub struct Satellite {
    id: String,
    kind: String,
    last_seen: Instant,
    active: bool,
    status: Vec<Value>,
}

impl Satellite {
    pub(crate) fn new(id: impl Into<String>, kind: impl Into<String>, now: Instant) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            last_seen: now,
            active: true,
            status: Vec::new(),
        }
    }

    /// Satellite id (`TTII`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Type name announced in HELLO (e.g. `INDUSTRIAL`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// When the last frame from this satellite arrived.
    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// `false` once the satellite missed the liveness timeout and until it
    /// is heard from again.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Values from the most recent STATUS frame.
    pub fn status(&self) -> &[Value] {
        &self.status
    }

    /// Record a valid frame. Returns `true` if this revived the link.
    pub(crate) fn touch(&mut self, now: Instant) -> bool {
        self.last_seen = now;
        !std::mem::replace(&mut self.active, true)
    }

    pub(crate) fn update_status(&mut self, values: Vec<Value>) {
        self.status = values;
    }

    /// Mark inactive if silent for longer than `timeout`. Returns `true` on
    /// the transition.
    pub(crate) fn expire(&mut self, now: Instant, timeout: Duration) -> bool {
        if self.active && now.saturating_duration_since(self.last_seen) > timeout {
            self.active = false;
            return true;
        }
        false
    }
}

/// Power rail readings from a POWER frame, in volts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    pub input: f64,
    pub bus: f64,
    pub logic: f64,
}

impl Telemetry {
    /// Build from `[input, bus, logic]`; missing entries read as 0.
    pub fn from_values(values: &[Value]) -> Self {
        Self {
            input: get_float(values, 0, 0.0),
            bus: get_float(values, 1, 0.0),
            logic: get_float(values, 2, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_transitions() {
        let start = Instant::now();
        let timeout = Duration::from_secs(5);
        let mut sat = Satellite::new("0101", "INDUSTRIAL", start);

        assert!(sat.is_active());
        assert!(!sat.expire(start + Duration::from_secs(5), timeout));
        assert!(sat.expire(start + Duration::from_millis(5001), timeout));
        assert!(!sat.is_active());

        // Only the first expiry counts as a transition
        assert!(!sat.expire(start + Duration::from_secs(9), timeout));

        assert!(sat.touch(start + Duration::from_secs(10)));
        assert!(sat.is_active());
        assert!(!sat.touch(start + Duration::from_secs(11)));
    }

    #[test]
    fn test_telemetry_from_values() {
        let values = vec![Value::Float(19.5), Value::Int(18)];
        assert_eq!(
            Telemetry::from_values(&values),
            Telemetry {
                input: 19.5,
                bus: 18.0,
                logic: 0.0
            }
        );
    }
}
