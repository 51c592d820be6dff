//! Bitrate ladders
//!
//! A ladder is an ordered table of quality levels ("buckets") for one usage
//! profile. The controller keeps a position in the active ladder and moves it
//! up or down in response to network and frame-drop signals.

use crate::format::{SupportedFormat, VideoFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Ladder construction errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LadderError {
    #[error("Ladder must contain at least one bucket")]
    Empty,

    #[error("Default index {index} out of range for {len} buckets")]
    DefaultOutOfRange { index: usize, len: usize },
}

/// Usage profile selecting which ladder is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// General desktop/mirroring content
    #[default]
    Default,
    /// Latency-sensitive interactive content, favours frame rate
    Gaming,
    /// Source is itself 1080p or higher video
    HdPlayback,
}

impl Profile {
    /// Pick the profile for the given gaming flag and source classification
    ///
    /// Gaming takes precedence over HD playback.
    pub fn select(gaming: bool, hd_source: bool) -> Self {
        if gaming {
            Profile::Gaming
        } else if hd_source {
            Profile::HdPlayback
        } else {
            Profile::Default
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Default => write!(f, "default"),
            Profile::Gaming => write!(f, "gaming"),
            Profile::HdPlayback => write!(f, "hd-playback"),
        }
    }
}

/// One quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Resolution and frame rate
    pub format: VideoFormat,
    /// Target video bitrate (kbps)
    pub video_rate_kbps: u32,
    /// Cleared while this load is known to cause frame drops
    pub available: bool,
    /// Whether the peer can decode this format
    pub supported: bool,
}

impl Bucket {
    /// Create an available, supported bucket
    pub const fn new(format: VideoFormat, video_rate_kbps: u32) -> Self {
        Bucket {
            format,
            video_rate_kbps,
            available: true,
            supported: true,
        }
    }

    /// Whether the bucket can be selected right now
    pub fn is_valid(&self) -> bool {
        self.available && self.supported
    }

    /// Nominal pixel throughput
    pub fn pixel_rate(&self) -> u64 {
        self.format.pixel_rate()
    }
}

const fn bucket(width: u32, height: u32, fps: u32, kbps: u32) -> Bucket {
    Bucket::new(VideoFormat::with_fps(width, height, fps), kbps)
}

/// General content; 640x480p60 is the mandatory fallback every sink accepts
const DEFAULT_LADDER: [Bucket; 5] = [
    bucket(640, 480, 60, 3_000),
    bucket(1280, 720, 30, 5_500),
    bucket(1280, 720, 60, 8_000),
    bucket(1920, 1080, 30, 10_000),
    bucket(1920, 1080, 60, 15_000),
];
const DEFAULT_START: usize = 2;

/// Interactive content, every step keeps 60 fps
const GAMING_LADDER: [Bucket; 3] = [
    bucket(640, 480, 60, 3_000),
    bucket(1280, 720, 60, 6_000),
    bucket(1920, 1080, 60, 12_000),
];
const GAMING_START: usize = 1;

/// 1080p source video, favours resolution over frame rate
const HD_PLAYBACK_LADDER: [Bucket; 5] = [
    bucket(640, 480, 60, 3_000),
    bucket(1280, 720, 30, 5_500),
    bucket(1920, 1080, 24, 8_000),
    bucket(1920, 1080, 30, 10_000),
    bucket(1920, 1080, 60, 16_000),
];
const HD_PLAYBACK_START: usize = 3;

/// Ordered bucket table with a current position
#[derive(Debug, Clone)]
pub struct Ladder {
    profile: Profile,
    buckets: Vec<Bucket>,
    default_index: usize,
    index: usize,
    min_index: usize,
}

impl Ladder {
    /// Create a ladder from an explicit bucket table
    ///
    /// The position starts at `default_index`. Built-in tables are ordered by
    /// pixel throughput; custom tables are taken as given.
    pub fn new(
        profile: Profile,
        buckets: Vec<Bucket>,
        default_index: usize,
    ) -> Result<Self, LadderError> {
        if buckets.is_empty() {
            return Err(LadderError::Empty);
        }
        if default_index >= buckets.len() {
            return Err(LadderError::DefaultOutOfRange {
                index: default_index,
                len: buckets.len(),
            });
        }

        let mut ladder = Ladder {
            profile,
            buckets,
            default_index,
            index: default_index,
            min_index: 0,
        };
        ladder.recompute_min_index();
        Ok(ladder)
    }

    /// Built-in ladder for a profile
    pub fn for_profile(profile: Profile) -> Self {
        let (table, start): (&[Bucket], usize) = match profile {
            Profile::Default => (&DEFAULT_LADDER, DEFAULT_START),
            Profile::Gaming => (&GAMING_LADDER, GAMING_START),
            Profile::HdPlayback => (&HD_PLAYBACK_LADDER, HD_PLAYBACK_START),
        };

        let mut ladder = Ladder {
            profile,
            buckets: table.to_vec(),
            default_index: start,
            index: start,
            min_index: 0,
        };
        ladder.recompute_min_index();
        ladder
    }

    /// Built-in ladder with `supported` flags taken from a capability list
    pub fn with_capabilities(profile: Profile, capabilities: &[SupportedFormat]) -> Self {
        let mut ladder = Self::for_profile(profile);
        ladder.apply_capabilities(capabilities);
        ladder.index = ladder.default_valid_index();
        ladder
    }

    /// Profile of this ladder
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false; ladders are never empty
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// All buckets, lowest first
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Bucket at an index
    pub fn get(&self, index: usize) -> Option<&Bucket> {
        self.buckets.get(index)
    }

    /// Current position
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current bucket
    pub fn current(&self) -> &Bucket {
        &self.buckets[self.index]
    }

    /// Floor position
    pub fn min_index(&self) -> usize {
        self.min_index
    }

    /// Nominal starting position of this ladder
    pub fn default_index(&self) -> usize {
        self.default_index
    }

    /// Whether the position is at the floor
    pub fn at_floor(&self) -> bool {
        self.index <= self.min_index
    }

    /// Move to an index, clamped into range
    pub fn set_index(&mut self, index: usize) {
        self.index = index.min(self.buckets.len() - 1);
    }

    /// Position of the bucket with exactly this format
    pub fn find(&self, format: &VideoFormat) -> Option<usize> {
        self.buckets.iter().position(|b| &b.format == format)
    }

    /// Mark buckets supported iff the peer advertises and supports their format
    pub fn apply_capabilities(&mut self, capabilities: &[SupportedFormat]) {
        for bucket in &mut self.buckets {
            bucket.supported = capabilities
                .iter()
                .any(|c| c.supported && c.format == bucket.format);
        }
        self.recompute_min_index();
    }

    /// Floor is bucket 1 when the peer supports it, skipping the 4:3 fallback
    fn recompute_min_index(&mut self) {
        self.min_index = match self.buckets.get(1) {
            Some(b) if b.supported => 1,
            _ => 0,
        };
    }

    /// Position of the next valid bucket above the current one
    ///
    /// Returns the current position when nothing above is valid.
    pub fn next_higher(&self) -> usize {
        self.buckets
            .iter()
            .enumerate()
            .skip(self.index + 1)
            .find(|(_, b)| b.is_valid())
            .map(|(i, _)| i)
            .unwrap_or(self.index)
    }

    /// Position of the next valid bucket below the current one
    ///
    /// Never goes below the floor; returns the floor when nothing below is
    /// valid.
    pub fn next_lower(&self) -> usize {
        if self.index <= self.min_index {
            return self.index;
        }
        (self.min_index..self.index)
            .rev()
            .find(|&i| self.buckets[i].is_valid())
            .unwrap_or(self.min_index)
    }

    /// Lowest valid bucket at or above the floor
    pub fn lowest_valid(&self) -> usize {
        (self.min_index..self.buckets.len())
            .find(|&i| self.buckets[i].is_valid())
            .unwrap_or(self.min_index)
    }

    /// Default position, or the closest valid bucket below it
    ///
    /// Falls back to the lowest valid bucket when nothing at or below the
    /// default is valid.
    pub fn default_valid_index(&self) -> usize {
        (0..=self.default_index)
            .rev()
            .find(|&i| self.buckets[i].is_valid())
            .unwrap_or_else(|| self.lowest_valid())
    }

    /// Mark the current bucket and every bucket at least as demanding unavailable
    pub fn invalidate_from_current(&mut self) -> usize {
        let threshold = self.current().pixel_rate();
        let mut count = 0;
        for bucket in &mut self.buckets {
            if bucket.pixel_rate() >= threshold && bucket.available {
                bucket.available = false;
                count += 1;
            }
        }
        tracing::debug!(
            "Invalidated {} buckets at or above {}",
            count,
            self.buckets[self.index].format
        );
        count
    }

    /// Mark every bucket available again
    pub fn restore_all(&mut self) {
        for bucket in &mut self.buckets {
            bucket.available = true;
        }
    }

    /// Number of buckets currently unavailable
    pub fn unavailable_count(&self) -> usize {
        self.buckets.iter().filter(|b| !b.available).count()
    }

    /// Map a 0..=100 policy percentage onto the supported buckets
    ///
    /// 0 selects the lowest supported bucket, 100 the highest. When nothing
    /// is supported the floor is returned.
    pub fn index_for_percent(&self, percent: u8) -> usize {
        let supported: Vec<usize> = self
            .buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.supported)
            .map(|(i, _)| i)
            .collect();

        if supported.is_empty() {
            return self.min_index;
        }

        let percent = percent.min(100) as usize;
        let slot = (percent * (supported.len() - 1) + 50) / 100;
        supported[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_ladder() -> Ladder {
        let mut unsupported = bucket(960, 540, 30, 3_500);
        unsupported.supported = false;
        let mut ladder = Ladder::new(
            Profile::Default,
            vec![bucket(640, 480, 60, 3_000), unsupported, bucket(1280, 720, 30, 5_500)],
            0,
        )
        .unwrap();
        ladder.set_index(0);
        ladder
    }

    #[test]
    fn test_increase_skips_unsupported() {
        let ladder = scenario_ladder();
        assert_eq!(ladder.min_index(), 0);
        assert_eq!(ladder.next_higher(), 2);
    }

    #[test]
    fn test_increase_at_top_is_noop() {
        let mut ladder = Ladder::for_profile(Profile::Gaming);
        ladder.set_index(2);
        assert_eq!(ladder.next_higher(), 2);
    }

    #[test]
    fn test_decrease_respects_floor() {
        let mut ladder = Ladder::for_profile(Profile::Default);
        assert_eq!(ladder.min_index(), 1);

        ladder.set_index(1);
        assert_eq!(ladder.next_lower(), 1);

        ladder.set_index(3);
        assert_eq!(ladder.next_lower(), 2);
    }

    #[test]
    fn test_decrease_without_valid_falls_to_floor() {
        let mut ladder = Ladder::for_profile(Profile::Default);
        ladder.set_index(2);
        ladder.invalidate_from_current();
        ladder.set_index(4);
        // Buckets 2..=4 unavailable, bucket 1 still valid
        assert_eq!(ladder.next_lower(), 1);

        ladder.buckets[1].available = false;
        assert_eq!(ladder.next_lower(), 1);
    }

    #[test]
    fn test_invalidate_by_pixel_rate() {
        let mut ladder = Ladder::for_profile(Profile::Default);
        ladder.set_index(2); // 720p60
        let invalidated = ladder.invalidate_from_current();

        // 720p60, 1080p30 and 1080p60 are at least as demanding
        assert_eq!(invalidated, 3);
        assert!(ladder.buckets()[1].is_valid());
        assert!(!ladder.buckets()[2].available);
        assert!(!ladder.buckets()[3].available);
        assert!(!ladder.buckets()[4].available);
        assert_eq!(ladder.next_higher(), 2);

        ladder.restore_all();
        assert_eq!(ladder.unavailable_count(), 0);
    }

    #[test]
    fn test_min_index_depends_on_capabilities() {
        let caps = vec![
            SupportedFormat::new(VideoFormat::with_fps(640, 480, 60), 3000),
            SupportedFormat::new(VideoFormat::with_fps(1280, 720, 60), 8000),
        ];
        let ladder = Ladder::with_capabilities(Profile::Default, &caps);

        // 720p30 not supported, so the floor drops to the fallback
        assert_eq!(ladder.min_index(), 0);
        assert_eq!(ladder.index(), 2);
        assert!(!ladder.buckets()[3].supported);
    }

    #[test]
    fn test_default_index_falls_back_below() {
        let caps = vec![
            SupportedFormat::new(VideoFormat::with_fps(640, 480, 60), 3000),
            SupportedFormat::new(VideoFormat::with_fps(1280, 720, 30), 5000),
        ];
        let ladder = Ladder::with_capabilities(Profile::HdPlayback, &caps);
        assert_eq!(ladder.index(), 1);
    }

    #[test]
    fn test_lowest_valid() {
        let mut ladder = scenario_ladder();
        ladder.set_index(2);
        assert_eq!(ladder.lowest_valid(), 0);

        ladder.buckets[0].available = false;
        assert_eq!(ladder.lowest_valid(), 2);
    }

    #[test]
    fn test_policy_percent_extremes() {
        let caps = vec![
            SupportedFormat::new(VideoFormat::with_fps(640, 480, 60), 3000),
            SupportedFormat::new(VideoFormat::with_fps(1280, 720, 30), 5000),
            SupportedFormat::new(VideoFormat::with_fps(1920, 1080, 30), 10000),
        ];
        let ladder = Ladder::with_capabilities(Profile::Default, &caps);

        assert_eq!(ladder.index_for_percent(0), 0);
        assert_eq!(ladder.index_for_percent(100), 3);
        assert_eq!(ladder.index_for_percent(50), 1);
        assert_eq!(ladder.index_for_percent(255), 3);
    }

    #[test]
    fn test_profile_selection() {
        assert_eq!(Profile::select(true, true), Profile::Gaming);
        assert_eq!(Profile::select(false, true), Profile::HdPlayback);
        assert_eq!(Profile::select(false, false), Profile::Default);
    }

    #[test]
    fn test_builtin_tables_are_ordered() {
        for profile in [Profile::Default, Profile::Gaming, Profile::HdPlayback] {
            let ladder = Ladder::for_profile(profile);
            for pair in ladder.buckets().windows(2) {
                assert!(pair[0].pixel_rate() < pair[1].pixel_rate(), "{}", profile);
            }
        }
    }

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            Ladder::new(Profile::Default, vec![], 0).unwrap_err(),
            LadderError::Empty
        );
        assert!(matches!(
            Ladder::new(Profile::Default, vec![bucket(640, 480, 60, 3000)], 1),
            Err(LadderError::DefaultOutOfRange { .. })
        ));
    }
}
