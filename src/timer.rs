//! Deadline timers driven by the controller loop.
//!
//! Expiry is never delivered from another context: the owner calls
//! [`DeadlineTimer::poll`] with the current time once per iteration and acts
//! on the result. This keeps every state change on the controller's thread.
//!
//! ```rust
//! use rs_rmpp::timer::DeadlineTimer;
//!
//! let mut inhibit = DeadlineTimer::one_shot(1000);
//! inhibit.start(0);
//! assert!(!inhibit.poll(999));
//! assert!(inhibit.poll(1000));
//! assert!(!inhibit.is_armed());
//! ```

/// Alive monitoring period.
pub const ALIVE_TIMEOUT_MS: u32 = 3000;

/// Minimum off time after a local stop.
pub const INHIBIT_MS: u32 = 1000;

/// Restartable countdown measured in milliseconds.
///
/// Fires when `now_ms >= start + period`, or for a [watchdog](Self::watchdog)
/// only once `now_ms > start + period`. Re-arming an armed timer restarts the
/// countdown; stopping a stopped timer does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineTimer {
    period_ms: u32,
    deadline_ms: Option<u64>,
    auto_reload: bool,
    strict: bool,
}

impl DeadlineTimer {
    /// Timer that disarms itself when it fires.
    pub const fn one_shot(period_ms: u32) -> Self {
        Self {
            period_ms,
            deadline_ms: None,
            auto_reload: false,
            strict: false,
        }
    }

    /// Timer that re-arms itself for another period when it fires.
    pub const fn auto_reload(period_ms: u32) -> Self {
        Self {
            period_ms,
            deadline_ms: None,
            auto_reload: true,
            strict: false,
        }
    }

    /// Auto-reload timer that fires only after more than a full period
    /// without a restart.
    ///
    /// ```rust
    /// use rs_rmpp::timer::DeadlineTimer;
    ///
    /// let mut alive = DeadlineTimer::watchdog(3000);
    /// alive.start(0);
    /// assert!(!alive.poll(3000));
    /// assert!(alive.poll(3001));
    /// ```
    pub const fn watchdog(period_ms: u32) -> Self {
        Self {
            period_ms,
            deadline_ms: None,
            auto_reload: true,
            strict: true,
        }
    }

    /// Arm (or restart) the countdown from `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms + u64::from(self.period_ms));
    }

    /// Restart the countdown if armed. A stopped timer stays stopped.
    pub fn reset(&mut self, now_ms: u64) {
        if self.is_armed() {
            self.start(now_ms);
        }
    }

    /// Disarm.
    pub fn stop(&mut self) {
        self.deadline_ms = None;
    }

    /// True while a deadline is pending.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Configured period.
    #[inline]
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Milliseconds until expiry, if armed.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms.map(|d| d.saturating_sub(now_ms))
    }

    /// Returns true exactly once per expiry.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let Some(deadline) = self.deadline_ms else {
            return false;
        };
        if now_ms < deadline || (self.strict && now_ms == deadline) {
            return false;
        }
        self.deadline_ms = if self.auto_reload {
            let next = deadline + u64::from(self.period_ms);
            Some(if next > now_ms {
                next
            } else {
                now_ms + u64::from(self.period_ms)
            })
        } else {
            None
        };
        true
    }
}

/// Fixed-rate schedule for periodic work (telemetry, debug dumps).
///
/// Unlike [`DeadlineTimer`] it is always running and has no arm/disarm.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period_ms: u32,
    last_ms: u64,
}

impl Interval {
    /// Schedule starting at `now_ms`.
    pub const fn new(period_ms: u32, now_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: now_ms,
        }
    }

    /// True when more than one period has passed since the last tick.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) > u64::from(self.period_ms) {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}
