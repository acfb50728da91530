//! Over-current fault monitoring.
//!
//! The monitor is level-sensitive: every poll with the line asserted and the
//! latch clear is a trip. Clearing is not done here; the controller asks
//! [`FaultMonitor::line_cleared`] when a clear is requested.

use crate::traits::FaultDetector;

/// Wraps the driver's fault line.
#[derive(Debug)]
pub struct FaultMonitor<F: FaultDetector> {
    line: F,
}

impl<F: FaultDetector> FaultMonitor<F> {
    /// Monitor the given line.
    pub fn new(line: F) -> Self {
        Self { line }
    }

    /// True when a new fault must be raised.
    ///
    /// Returns false while `latched` so a held line trips only once.
    pub fn should_trip(&mut self, latched: bool) -> bool {
        !latched && self.line.is_asserted()
    }

    /// True when the physical line reports no fault.
    pub fn line_cleared(&mut self) -> bool {
        !self.line.is_asserted()
    }

    /// The underlying line.
    pub fn line(&self) -> &F {
        &self.line
    }

    /// Mutable access to the underlying line.
    pub fn line_mut(&mut self) -> &mut F {
        &mut self.line
    }
}
