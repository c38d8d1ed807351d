use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchStatus {
    On,
    Off,
}

impl fmt::Display for SwitchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwitchStatus::On => "ON",
            SwitchStatus::Off => "OFF",
        })
    }
}

/// On/off gate for producing or handling cluster events
#[derive(Debug)]
pub struct Switch {
    on: AtomicBool,
}

impl Switch {
    pub fn new(status: SwitchStatus) -> Self {
        Self {
            on: AtomicBool::new(status == SwitchStatus::On),
        }
    }

    pub fn status(&self) -> SwitchStatus {
        if self.on.load(Ordering::Acquire) {
            SwitchStatus::On
        } else {
            SwitchStatus::Off
        }
    }

    pub fn set(&self, status: SwitchStatus) {
        let previous = self.on.swap(status == SwitchStatus::On, Ordering::AcqRel);
        if previous != (status == SwitchStatus::On) {
            info!(status = %status, "switch changed");
        }
    }

    pub fn turn_on(&self) {
        self.set(SwitchStatus::On);
    }

    pub fn turn_off(&self) {
        self.set(SwitchStatus::Off);
    }
}

impl Default for Switch {
    fn default() -> Self {
        Self::new(SwitchStatus::On)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_toggles() {
        let switch = Switch::default();
        assert_eq!(switch.status(), SwitchStatus::On);

        switch.turn_off();
        assert_eq!(switch.status(), SwitchStatus::Off);
        switch.turn_off();
        assert_eq!(switch.status(), SwitchStatus::Off);

        switch.turn_on();
        assert_eq!(switch.status(), SwitchStatus::On);
    }

    #[test]
    fn test_switch_display() {
        assert_eq!(SwitchStatus::On.to_string(), "ON");
        assert_eq!(SwitchStatus::Off.to_string(), "OFF");
    }
}
