//! Push-button gesture detection.
//!
//! The button is sampled every [`SAMPLE_PERIOD_MS`]. A level must stay stable
//! for [`PRESS_TIME_MS`] before it counts. A press released before
//! [`HOLD_TIME_MS`] is a [`ButtonEvent::Click`]; reaching the hold time while
//! still pressed is a [`ButtonEvent::Hold`] and suppresses the click.

use crate::traits::ButtonEvent;

/// Sampling period.
pub const SAMPLE_PERIOD_MS: u32 = 25;
/// Minimum stable time for a level change to count.
pub const PRESS_TIME_MS: u32 = 50;
/// Press duration that turns into a hold.
pub const HOLD_TIME_MS: u32 = 1000;

const PRESS_COUNT: u32 = PRESS_TIME_MS / SAMPLE_PERIOD_MS;
const HOLD_COUNT: u32 = HOLD_TIME_MS / SAMPLE_PERIOD_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Released,
    Pressed,
    Held,
}

/// Sample-count debouncer for a single button.
#[derive(Debug, Clone)]
pub struct Debouncer {
    previous: bool,
    stable_count: u32,
    phase: Phase,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debouncer {
    /// Debouncer starting in the released state.
    pub const fn new() -> Self {
        Self {
            previous: false,
            stable_count: 0,
            phase: Phase::Released,
        }
    }

    /// Feed one sample (`pressed` already polarity-corrected).
    pub fn sample(&mut self, pressed: bool) -> Option<ButtonEvent> {
        if pressed != self.previous {
            self.previous = pressed;
            self.stable_count = 0;
            return None;
        }

        self.stable_count = self.stable_count.saturating_add(1);
        if self.stable_count < PRESS_COUNT {
            return None;
        }

        match (pressed, self.phase) {
            (true, Phase::Released) => {
                self.phase = Phase::Pressed;
                None
            }
            (true, Phase::Pressed) if self.stable_count >= HOLD_COUNT => {
                self.phase = Phase::Held;
                Some(ButtonEvent::Hold)
            }
            (false, Phase::Pressed) => {
                self.phase = Phase::Released;
                Some(ButtonEvent::Click)
            }
            (false, Phase::Held) => {
                self.phase = Phase::Released;
                None
            }
            _ => None,
        }
    }
}
