//! Property-based tests for ladder policy, hysteresis and drop detection

use proptest::prelude::*;
use std::time::{Duration, Instant};
use wfd_core::{
    BandwidthSignal, DropThresholds, DropVerdict, FrameDropDetector, HysteresisAction,
    HysteresisController, Ladder, Profile, SupportedFormat, DROP_RING_SIZE, UP_THRESHOLD,
};
use wfd_tests::full_capabilities;

// Property test strategies

fn profile_strategy() -> impl Strategy<Value = Profile> {
    prop_oneof![
        Just(Profile::Default),
        Just(Profile::Gaming),
        Just(Profile::HdPlayback),
    ]
}

/// Capability lists where at least one entry stays supported
fn capability_strategy() -> impl Strategy<Value = Vec<SupportedFormat>> {
    prop::collection::vec(any::<bool>(), 6)
        .prop_filter("needs one supported format", |keep| keep.iter().any(|k| *k))
        .prop_map(|keep| {
            full_capabilities()
                .into_iter()
                .zip(keep)
                .map(|(cap, keep)| {
                    if keep {
                        cap
                    } else {
                        SupportedFormat::unsupported(cap.format, cap.default_bitrate_kbps)
                    }
                })
                .collect()
        })
}

fn signal_strategy() -> impl Strategy<Value = BandwidthSignal> {
    prop_oneof![
        Just(BandwidthSignal::Up),
        Just(BandwidthSignal::Down),
        Just(BandwidthSignal::MinUnavailable),
        Just(BandwidthSignal::MinAvailable),
    ]
}

// Property tests

proptest! {
    #[test]
    fn prop_policy_is_monotonic(
        profile in profile_strategy(),
        caps in capability_strategy(),
        a in 0u8..=100,
        b in 0u8..=100,
    ) {
        let ladder = Ladder::with_capabilities(profile, &caps);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ladder.index_for_percent(low) <= ladder.index_for_percent(high));
    }

    #[test]
    fn prop_policy_extremes_hit_supported_ends(
        profile in profile_strategy(),
        caps in capability_strategy(),
    ) {
        let ladder = Ladder::with_capabilities(profile, &caps);
        let supported: Vec<usize> = ladder
            .buckets()
            .iter()
            .enumerate()
            .filter(|(_, b)| b.supported)
            .map(|(i, _)| i)
            .collect();
        prop_assume!(!supported.is_empty());

        prop_assert_eq!(ladder.index_for_percent(0), supported[0]);
        prop_assert_eq!(ladder.index_for_percent(100), supported[supported.len() - 1]);
        let mid = ladder.index_for_percent(50);
        prop_assert!(ladder.buckets()[mid].supported);
    }

    #[test]
    fn prop_ladder_moves_stay_on_valid_buckets(
        profile in profile_strategy(),
        caps in capability_strategy(),
        start in 0usize..5,
    ) {
        let mut ladder = Ladder::with_capabilities(profile, &caps);
        ladder.set_index(start);
        let current = ladder.index();

        let higher = ladder.next_higher();
        prop_assert!(higher >= current);
        prop_assert!(higher == current || ladder.buckets()[higher].is_valid());

        let lower = ladder.next_lower();
        prop_assert!(lower <= current);
        prop_assert!(lower >= ladder.min_index() || lower == current);
    }

    #[test]
    fn prop_down_clears_up_count(signals in prop::collection::vec(signal_strategy(), 0..40)) {
        let mut hysteresis = HysteresisController::default();
        for signal in signals {
            let action = hysteresis.on_signal(signal, false);
            match signal {
                BandwidthSignal::Down => prop_assert_eq!(hysteresis.up_count(), 0),
                BandwidthSignal::MinUnavailable => {
                    prop_assert_eq!(action, HysteresisAction::ForceLowest);
                    prop_assert_eq!(hysteresis.up_count(), 0);
                    prop_assert_eq!(hysteresis.down_count(), 0);
                }
                BandwidthSignal::Up => prop_assert_eq!(hysteresis.down_count(), 0),
                BandwidthSignal::MinAvailable => prop_assert_eq!(action, HysteresisAction::Hold),
            }
            prop_assert!(hysteresis.up_count() < UP_THRESHOLD);
        }
    }

    #[test]
    fn prop_increase_after_exactly_threshold_ups(prefix in prop::collection::vec(signal_strategy(), 0..20)) {
        let mut hysteresis = HysteresisController::default();
        for signal in prefix {
            hysteresis.on_signal(signal, false);
        }
        hysteresis.reset();

        let increases = (0..UP_THRESHOLD)
            .map(|_| hysteresis.on_signal(BandwidthSignal::Up, false))
            .filter(|a| *a == HysteresisAction::Increase)
            .count();
        prop_assert_eq!(increases, 1);
    }

    #[test]
    fn prop_fewer_than_ring_size_never_sustained(
        count in 0usize..DROP_RING_SIZE,
        gaps_ms in prop::collection::vec(0u64..2_000, DROP_RING_SIZE),
    ) {
        let mut detector = FrameDropDetector::new(DropThresholds::default());
        let mut now = Instant::now();
        for gap in gaps_ms.into_iter().take(count) {
            now += Duration::from_millis(gap);
            let verdict = detector.record(30, Duration::from_secs(1), 60.0, now);
            prop_assert_eq!(verdict, DropVerdict::Recorded);
        }
    }

    #[test]
    fn prop_full_ring_sustained_iff_within_window(gap_ms in 0u64..4_000) {
        let mut detector = FrameDropDetector::new(DropThresholds::default());
        let start = Instant::now();
        let mut verdict = DropVerdict::Ignored;
        for i in 0..DROP_RING_SIZE as u64 {
            let at = start + Duration::from_millis(i * gap_ms);
            verdict = detector.record(30, Duration::from_secs(1), 60.0, at);
        }

        // Oldest and newest of the seven reports are six gaps apart
        let span = Duration::from_millis(gap_ms * (DROP_RING_SIZE as u64 - 1));
        if span <= Duration::from_secs(10) {
            prop_assert_eq!(verdict, DropVerdict::Sustained);
        } else {
            prop_assert_eq!(verdict, DropVerdict::Recorded);
        }
    }
}
