//! Output state owned by the [`OutputController`](crate::OutputController).
//!
//! Only the controller mutates an [`OutputState`]; everyone else gets a copy
//! through [`OutputController::state`](crate::OutputController::state).

use crate::codec::{OutputFlags, StatusFlags};
use crate::traits::Direction;

/// Operating mode of the track output.
///
/// The discriminants are the values carried in the low nibble of the
/// output-flags byte. `Inhibit` was added after the others and takes the next
/// free value so that existing clients keep decoding the first five.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum OutputMode {
    /// Controller not started yet.
    #[default]
    Init = 0,
    /// Output off, ready to start.
    Off = 1,
    /// Output driving the track.
    On = 2,
    /// Motor driver protection latched.
    Fault = 3,
    /// Unrecoverable internal error (terminal).
    Fail = 4,
    /// Cool-down after a local stop; starts are refused.
    Inhibit = 5,
}

impl OutputMode {
    /// Value used in the output-flags byte.
    #[inline]
    pub const fn wire_value(self) -> u8 {
        self as u8
    }

    /// Parse the low nibble of an output-flags byte.
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(OutputMode::Init),
            1 => Some(OutputMode::Off),
            2 => Some(OutputMode::On),
            3 => Some(OutputMode::Fault),
            4 => Some(OutputMode::Fail),
            5 => Some(OutputMode::Inhibit),
            _ => None,
        }
    }

    /// Lowercase name, used in logs and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            OutputMode::Init => "init",
            OutputMode::Off => "off",
            OutputMode::On => "on",
            OutputMode::Fault => "fault",
            OutputMode::Fail => "fail",
            OutputMode::Inhibit => "inhibit",
        }
    }
}

impl core::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the output stage.
///
/// Invariants kept by the controller:
/// - `mode == On` implies `direction` is `Forward` or `Reverse`
/// - `mode == Fault` implies `over_current`
/// - `commanded_duty` is 0 unless `mode == On`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct OutputState {
    pub(crate) mode: OutputMode,
    pub(crate) direction: Direction,
    pub(crate) commanded_duty: u16,
    pub(crate) external_control: bool,
    pub(crate) over_current: bool,
}

impl OutputState {
    /// State at power-up.
    pub const fn new() -> Self {
        Self {
            mode: OutputMode::Init,
            direction: Direction::None,
            commanded_duty: 0,
            external_control: false,
            over_current: false,
        }
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Latched direction (`None` while off).
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Last duty accepted by `set_output_duty` (0..=4095 in normal use).
    #[inline]
    pub fn commanded_duty(&self) -> u16 {
        self.commanded_duty
    }

    /// True while a remote client is in control of the output.
    #[inline]
    pub fn external_control(&self) -> bool {
        self.external_control
    }

    /// True while the over-current latch is set.
    #[inline]
    pub fn over_current(&self) -> bool {
        self.over_current
    }

    /// Flags for byte 1 of the status frame.
    pub fn output_flags(&self) -> OutputFlags {
        OutputFlags {
            mode: self.mode,
            direction: self.direction,
        }
    }

    /// Flags for byte 2 of the status frame.
    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags {
            external_control: self.external_control,
            over_current: self.over_current,
            system_fail: self.mode == OutputMode::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_wire_values_are_stable() {
        assert_eq!(OutputMode::Init.wire_value(), 0);
        assert_eq!(OutputMode::Off.wire_value(), 1);
        assert_eq!(OutputMode::On.wire_value(), 2);
        assert_eq!(OutputMode::Fault.wire_value(), 3);
        assert_eq!(OutputMode::Fail.wire_value(), 4);
        assert_eq!(OutputMode::Inhibit.wire_value(), 5);
    }

    #[test]
    fn mode_from_wire_rejects_unknown() {
        for value in 0..=5 {
            let mode = OutputMode::from_wire(value).unwrap();
            assert_eq!(mode.wire_value(), value);
        }
        assert_eq!(OutputMode::from_wire(6), None);
        assert_eq!(OutputMode::from_wire(0x0F), None);
    }

    #[test]
    fn new_state_is_init_and_idle() {
        let state = OutputState::new();
        assert_eq!(state.mode(), OutputMode::Init);
        assert_eq!(state.direction(), Direction::None);
        assert_eq!(state.commanded_duty(), 0);
        assert!(!state.external_control());
        assert!(!state.over_current());
    }

    #[test]
    fn status_flags_report_fail_mode() {
        let state = OutputState {
            mode: OutputMode::Fail,
            ..OutputState::new()
        };
        assert!(state.status_flags().system_fail);
        assert!(!OutputState::new().status_flags().system_fail);
    }
}
