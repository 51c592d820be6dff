//! Video and audio format value types
//!
//! A [`VideoFormat`] is the unit exchanged with the peer during renegotiation
//! and the node type of the compatibility graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution and frame rate of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoFormat {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate numerator
    pub frame_rate_num: u32,
    /// Frame rate denominator
    pub frame_rate_den: u32,
}

impl VideoFormat {
    /// Create a new format with a fractional frame rate
    pub const fn new(width: u32, height: u32, frame_rate_num: u32, frame_rate_den: u32) -> Self {
        VideoFormat {
            width,
            height,
            frame_rate_num,
            frame_rate_den,
        }
    }

    /// Create a new format with an integral frame rate
    pub const fn with_fps(width: u32, height: u32, fps: u32) -> Self {
        Self::new(width, height, fps, 1)
    }

    /// Frame rate in frames per second
    pub fn frame_rate(&self) -> f64 {
        if self.frame_rate_den == 0 {
            return 0.0;
        }
        self.frame_rate_num as f64 / self.frame_rate_den as f64
    }

    /// Nominal pixel throughput (pixels per second)
    pub fn pixel_rate(&self) -> u64 {
        if self.frame_rate_den == 0 {
            return 0;
        }
        self.width as u64 * self.height as u64 * self.frame_rate_num as u64
            / self.frame_rate_den as u64
    }

    /// Whether both formats have the same resolution
    pub fn same_resolution(&self, other: &VideoFormat) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Whether both formats have the same frame rate
    ///
    /// Compared as fractions so that 60/1 and 120/2 are equal.
    pub fn same_frame_rate(&self, other: &VideoFormat) -> bool {
        self.frame_rate_num as u64 * other.frame_rate_den as u64
            == other.frame_rate_num as u64 * self.frame_rate_den as u64
    }

    /// Whether a single renegotiation step can move between the two formats
    ///
    /// The peer only supports changing one axis at a time, so exactly one of
    /// resolution or frame rate must stay the same.
    pub fn is_adjacent(&self, other: &VideoFormat) -> bool {
        self.same_resolution(other) ^ self.same_frame_rate(other)
    }

    /// Whether this is at least a 1080-line format
    pub fn is_full_hd(&self) -> bool {
        self.height >= 1080
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frame_rate_den == 1 {
            write!(f, "{}x{}@{}", self.width, self.height, self.frame_rate_num)
        } else {
            write!(
                f,
                "{}x{}@{}/{}",
                self.width, self.height, self.frame_rate_num, self.frame_rate_den
            )
        }
    }
}

/// One entry of the peer's advertised capability list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFormat {
    /// The advertised format
    pub format: VideoFormat,
    /// Bitrate the peer suggests for this format (kbps)
    pub default_bitrate_kbps: u32,
    /// Whether the peer can actually decode this format
    pub supported: bool,
}

impl SupportedFormat {
    /// Create a supported capability entry
    pub fn new(format: VideoFormat, default_bitrate_kbps: u32) -> Self {
        SupportedFormat {
            format,
            default_bitrate_kbps,
            supported: true,
        }
    }

    /// Create an advertised but unsupported entry
    pub fn unsupported(format: VideoFormat, default_bitrate_kbps: u32) -> Self {
        SupportedFormat {
            format,
            default_bitrate_kbps,
            supported: false,
        }
    }
}

/// Audio format of the stream
///
/// Renegotiation carries the audio format unchanged; the controller only
/// needs to know whether one is currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz
    pub sample_rate_hz: u32,
    /// Channel count
    pub channels: u8,
}

impl AudioFormat {
    /// 48 kHz stereo
    pub const fn stereo_48k() -> Self {
        AudioFormat {
            sample_rate_hz: 48_000,
            channels: 2,
        }
    }
}

/// User-selectable resolution targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPreset {
    /// 640x480 at 60 fps
    P480p60,
    /// 1280x720 at 30 fps
    P720p30,
    /// 1280x720 at 60 fps
    P720p60,
    /// 1920x1080 at 30 fps
    P1080p30,
    /// 1920x1080 at 60 fps
    P1080p60,
}

impl ResolutionPreset {
    /// All presets, lowest first
    pub const ALL: [ResolutionPreset; 5] = [
        ResolutionPreset::P480p60,
        ResolutionPreset::P720p30,
        ResolutionPreset::P720p60,
        ResolutionPreset::P1080p30,
        ResolutionPreset::P1080p60,
    ];

    /// Format this preset stands for
    pub fn format(self) -> VideoFormat {
        match self {
            ResolutionPreset::P480p60 => VideoFormat::with_fps(640, 480, 60),
            ResolutionPreset::P720p30 => VideoFormat::with_fps(1280, 720, 30),
            ResolutionPreset::P720p60 => VideoFormat::with_fps(1280, 720, 60),
            ResolutionPreset::P1080p30 => VideoFormat::with_fps(1920, 1080, 30),
            ResolutionPreset::P1080p60 => VideoFormat::with_fps(1920, 1080, 60),
        }
    }

    /// Look up a preset by its numeric id (position in [`Self::ALL`])
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}
