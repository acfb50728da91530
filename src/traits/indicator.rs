//! Status LED interface.
//!
//! The controller never renders LED patterns itself. It posts requests to an
//! [`Indicator`], which is expected to forward them to whatever task owns the
//! LED. Every call is fire-and-forget.

/// LED colors understood by the indicator task.
///
/// `Standby` resolves to the color set with [`Indicator::set_standby_color`],
/// which depends on the network mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LedColor {
    /// The configured standby color.
    #[default]
    Standby,
    /// Fault.
    Red,
    /// Output on.
    Green,
    /// Station mode standby.
    Blue,
    #[allow(missing_docs)]
    Yellow,
    /// Access point mode standby.
    Magenta,
    #[allow(missing_docs)]
    Aqua,
    #[allow(missing_docs)]
    White,
}

/// LED light patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LedPattern {
    /// Dark.
    #[default]
    Off,
    /// Steady on.
    On,
    /// Short flash, mostly off.
    BlinkOn10,
    /// Short gap, mostly on.
    BlinkOn90,
    /// Fast even blink.
    BlinkFast,
    /// Slow even blink.
    BlinkSlow,
}

/// Fire-and-forget LED control.
pub trait Indicator {
    /// Set the active color.
    fn set_color(&mut self, color: LedColor);

    /// Set the steady pattern.
    fn set_pattern(&mut self, pattern: LedPattern);

    /// Play `pattern` for `cycles` cycles, then return to the steady pattern.
    fn set_pattern_once(&mut self, pattern: LedPattern, cycles: u8);

    /// Choose which color [`LedColor::Standby`] stands for.
    fn set_standby_color(&mut self, color: LedColor);
}

impl<T: Indicator + ?Sized> Indicator for &mut T {
    fn set_color(&mut self, color: LedColor) {
        (**self).set_color(color)
    }

    fn set_pattern(&mut self, pattern: LedPattern) {
        (**self).set_pattern(pattern)
    }

    fn set_pattern_once(&mut self, pattern: LedPattern, cycles: u8) {
        (**self).set_pattern_once(pattern, cycles)
    }

    fn set_standby_color(&mut self, color: LedColor) {
        (**self).set_standby_color(color)
    }
}
