//! Frame-drop detection
//!
//! Tracks recent moments where the encoder dropped an excessive share of
//! frames. A single burst is ignored; only a dense cluster of excessive
//! reports inside a short window counts as sustained degradation.

use std::time::{Duration, Instant};

/// Number of excessive reports that must fall inside the window
pub const DROP_RING_SIZE: usize = 7;

/// Detector thresholds
#[derive(Debug, Clone, Copy)]
pub struct DropThresholds {
    /// Drop rate, as a share of the nominal frame rate, below which reports are ignored
    pub min_ratio: f64,
    /// Drop share at the floor bucket that makes the session unrecoverable
    pub fatal_ratio: f64,
    /// Window that the whole ring must fit into to signal degradation
    pub window: Duration,
}

impl Default for DropThresholds {
    fn default() -> Self {
        Self {
            min_ratio: 0.05,
            fatal_ratio: 0.30,
            window: Duration::from_secs(10),
        }
    }
}

/// Result of feeding one drop report to the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropVerdict {
    /// Drop rate under the minimum threshold
    Ignored,
    /// Excessive, recorded, but not yet sustained
    Recorded,
    /// Ring is full and spans no more than the window
    Sustained,
}

/// Sliding ring of excessive-drop timestamps
#[derive(Debug, Clone)]
pub struct FrameDropDetector {
    thresholds: DropThresholds,
    /// Empty slots count as infinitely old
    ring: [Option<Instant>; DROP_RING_SIZE],
    cursor: usize,
    wrapped: bool,
}

impl FrameDropDetector {
    /// Create a detector
    pub fn new(thresholds: DropThresholds) -> Self {
        FrameDropDetector {
            thresholds,
            ring: [None; DROP_RING_SIZE],
            cursor: 0,
            wrapped: false,
        }
    }

    /// Whether a report is excessive enough to record
    pub fn is_excessive(&self, dropped: u32, elapsed: Duration, nominal_fps: f64) -> bool {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 || nominal_fps <= 0.0 {
            return false;
        }
        dropped as f64 / secs >= self.thresholds.min_ratio * nominal_fps
    }

    /// Whether the drop share is beyond what the lowest quality can absorb
    ///
    /// Only meaningful when the ladder is already at its floor.
    pub fn is_unrecoverable(&self, dropped: u32, elapsed: Duration, nominal_fps: f64) -> bool {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 || nominal_fps <= 0.0 {
            return false;
        }
        dropped as f64 > self.thresholds.fatal_ratio * nominal_fps * secs
    }

    /// Feed one drop report observed at `now`
    pub fn record(
        &mut self,
        dropped: u32,
        elapsed: Duration,
        nominal_fps: f64,
        now: Instant,
    ) -> DropVerdict {
        if !self.is_excessive(dropped, elapsed, nominal_fps) {
            tracing::trace!(
                "Ignoring {} dropped frames over {:?} at {:.1} fps",
                dropped,
                elapsed,
                nominal_fps
            );
            return DropVerdict::Ignored;
        }

        self.ring[self.cursor] = Some(now);
        self.cursor = (self.cursor + 1) % DROP_RING_SIZE;
        if self.cursor == 0 {
            self.wrapped = true;
        }

        if !self.wrapped {
            return DropVerdict::Recorded;
        }

        // After advancing, the cursor points at the oldest entry
        match self.ring[self.cursor] {
            Some(oldest) if now.saturating_duration_since(oldest) <= self.thresholds.window => {
                DropVerdict::Sustained
            }
            _ => DropVerdict::Recorded,
        }
    }

    /// Forget all recorded reports
    pub fn reset(&mut self) {
        self.ring = [None; DROP_RING_SIZE];
        self.cursor = 0;
        self.wrapped = false;
    }

    /// Number of recorded reports, capped at the ring size
    pub fn recorded(&self) -> usize {
        self.ring.iter().filter(|slot| slot.is_some()).count()
    }

    /// Thresholds in use
    pub fn thresholds(&self) -> &DropThresholds {
        &self.thresholds
    }
}

impl Default for FrameDropDetector {
    fn default() -> Self {
        Self::new(DropThresholds::default())
    }
}
