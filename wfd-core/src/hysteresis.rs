//! Bandwidth hysteresis
//!
//! Converts the periodic signals of an external bandwidth estimator into
//! ladder moves. A move requires several consecutive samples in the same
//! direction so that a noisy estimator does not make the stream oscillate.

use serde::{Deserialize, Serialize};

/// Consecutive UP samples needed before stepping up
pub const UP_THRESHOLD: u32 = 5;

/// Consecutive DOWN samples needed before stepping down
pub const DOWN_THRESHOLD: u32 = 2;

/// Signal delivered by the bandwidth estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthSignal {
    /// Link can sustain more
    Up,
    /// Link is saturated
    Down,
    /// Even the minimum rate cannot be sustained
    MinUnavailable,
    /// Minimum rate is sustainable again
    MinAvailable,
}

/// Ladder move requested by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HysteresisAction {
    /// Nothing to do
    Hold,
    /// Step to the next valid bucket above
    Increase,
    /// Step to the next valid bucket below
    Decrease,
    /// Drop straight to the lowest valid bucket
    ForceLowest,
}

/// Counter state for consecutive same-direction samples
#[derive(Debug, Clone)]
pub struct HysteresisController {
    up_threshold: u32,
    down_threshold: u32,
    up_count: u32,
    down_count: u32,
}

impl HysteresisController {
    /// Create a controller; thresholds below 1 are raised to 1
    pub fn new(up_threshold: u32, down_threshold: u32) -> Self {
        HysteresisController {
            up_threshold: up_threshold.max(1),
            down_threshold: down_threshold.max(1),
            up_count: 0,
            down_count: 0,
        }
    }

    /// Process one estimator signal
    ///
    /// `up_vetoed` marks an UP sample as unreliable because the observed
    /// outgoing rate is far below what the ladder expects; such samples are
    /// dropped without counting.
    pub fn on_signal(&mut self, signal: BandwidthSignal, up_vetoed: bool) -> HysteresisAction {
        match signal {
            BandwidthSignal::Up => {
                self.down_count = 0;
                if up_vetoed {
                    tracing::trace!("UP sample vetoed, observed rate too low");
                    return HysteresisAction::Hold;
                }
                self.up_count += 1;
                if self.up_count >= self.up_threshold {
                    self.up_count = 0;
                    HysteresisAction::Increase
                } else {
                    HysteresisAction::Hold
                }
            }
            BandwidthSignal::Down => {
                self.up_count = 0;
                self.down_count += 1;
                if self.down_count >= self.down_threshold {
                    self.down_count = 0;
                    HysteresisAction::Decrease
                } else {
                    HysteresisAction::Hold
                }
            }
            BandwidthSignal::MinUnavailable => {
                self.reset();
                HysteresisAction::ForceLowest
            }
            BandwidthSignal::MinAvailable => HysteresisAction::Hold,
        }
    }

    /// Clear both counters
    pub fn reset(&mut self) {
        self.up_count = 0;
        self.down_count = 0;
    }

    /// Consecutive UP samples so far
    pub fn up_count(&self) -> u32 {
        self.up_count
    }

    /// Consecutive DOWN samples so far
    pub fn down_count(&self) -> u32 {
        self.down_count
    }
}

impl Default for HysteresisController {
    fn default() -> Self {
        Self::new(UP_THRESHOLD, DOWN_THRESHOLD)
    }
}

/// Whether an observed outgoing rate is too low to trust an UP sample
///
/// `reference_kbps` is the nominal rate of the bucket the stream should at
/// least be carrying. Without an observation nothing is vetoed.
pub fn is_rate_starved(observed_kbps: Option<u32>, reference_kbps: u32, veto_ratio: f64) -> bool {
    match observed_kbps {
        Some(observed) => (observed as f64) < reference_kbps as f64 * veto_ratio,
        None => false,
    }
}

/// Observed rate to report back to the estimator, in whole Mbps
pub fn estimator_report_mbps(observed_kbps: u32, max_mbps: u32) -> u32 {
    let max = max_mbps.max(1);
    (observed_kbps / 1000).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_up_threshold_increases_once() {
        let mut hysteresis = HysteresisController::default();

        for _ in 0..UP_THRESHOLD - 1 {
            assert_eq!(
                hysteresis.on_signal(BandwidthSignal::Up, false),
                HysteresisAction::Hold
            );
        }
        assert_eq!(
            hysteresis.on_signal(BandwidthSignal::Up, false),
            HysteresisAction::Increase
        );
        assert_eq!(hysteresis.up_count(), 0);
    }

    #[test]
    fn test_down_resets_up_count() {
        let mut hysteresis = HysteresisController::default();

        for _ in 0..4 {
            hysteresis.on_signal(BandwidthSignal::Up, false);
        }
        assert_eq!(hysteresis.up_count(), 4);

        hysteresis.on_signal(BandwidthSignal::Down, false);
        assert_eq!(hysteresis.up_count(), 0);
        assert_eq!(hysteresis.down_count(), 1);

        // Four more UPs are not enough after the reset
        for _ in 0..4 {
            assert_eq!(
                hysteresis.on_signal(BandwidthSignal::Up, false),
                HysteresisAction::Hold
            );
        }
    }

    #[test]
    fn test_down_threshold() {
        let mut hysteresis = HysteresisController::default();
        assert_eq!(
            hysteresis.on_signal(BandwidthSignal::Down, false),
            HysteresisAction::Hold
        );
        assert_eq!(
            hysteresis.on_signal(BandwidthSignal::Down, false),
            HysteresisAction::Decrease
        );
        assert_eq!(hysteresis.down_count(), 0);
    }

    #[test]
    fn test_vetoed_up_is_not_counted() {
        let mut hysteresis = HysteresisController::default();
        hysteresis.on_signal(BandwidthSignal::Down, false);

        for _ in 0..10 {
            assert_eq!(
                hysteresis.on_signal(BandwidthSignal::Up, true),
                HysteresisAction::Hold
            );
        }
        assert_eq!(hysteresis.up_count(), 0);
        assert_eq!(hysteresis.down_count(), 0);
    }

    #[test]
    fn test_min_unavailable_resets_counters() {
        let mut hysteresis = HysteresisController::default();
        hysteresis.on_signal(BandwidthSignal::Up, false);
        hysteresis.on_signal(BandwidthSignal::Up, false);

        assert_eq!(
            hysteresis.on_signal(BandwidthSignal::MinUnavailable, false),
            HysteresisAction::ForceLowest
        );
        assert_eq!(hysteresis.up_count(), 0);
        assert_eq!(hysteresis.down_count(), 0);
    }

    #[test]
    fn test_min_available_is_passive() {
        let mut hysteresis = HysteresisController::default();
        hysteresis.on_signal(BandwidthSignal::Up, false);

        assert_eq!(
            hysteresis.on_signal(BandwidthSignal::MinAvailable, false),
            HysteresisAction::Hold
        );
        assert_eq!(hysteresis.up_count(), 1);
    }

    #[test]
    fn test_rate_starvation() {
        assert!(is_rate_starved(Some(2_000), 8_000, 0.5));
        assert!(!is_rate_starved(Some(4_000), 8_000, 0.5));
        assert!(!is_rate_starved(None, 8_000, 0.5));
    }

    #[test]
    fn test_estimator_report_is_clamped() {
        assert_eq!(estimator_report_mbps(0, 40), 1);
        assert_eq!(estimator_report_mbps(12_500, 40), 12);
        assert_eq!(estimator_report_mbps(90_000, 40), 40);
        assert_eq!(estimator_report_mbps(5_000, 0), 1);
    }
}
