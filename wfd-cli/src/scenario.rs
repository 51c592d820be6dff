//! Scenario files for the session simulator

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use wfd_core::{BandwidthSignal, SupportedFormat, VideoFormat};
use wfd_session::{HdcpStatus, SessionConfig, StreamStatus};

/// Resolution and integral frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl FormatSpec {
    pub fn format(&self) -> VideoFormat {
        VideoFormat::with_fps(self.width, self.height, self.fps)
    }
}

/// One entry of the simulated peer's capability list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Bitrate the peer proposes for this format (kbps)
    pub default_bitrate_kbps: u32,
    /// Whether the peer can decode it
    #[serde(default = "default_supported")]
    pub supported: bool,
}

fn default_supported() -> bool {
    true
}

impl PeerFormat {
    pub fn to_supported(&self) -> SupportedFormat {
        SupportedFormat {
            format: VideoFormat::with_fps(self.width, self.height, self.fps),
            default_bitrate_kbps: self.default_bitrate_kbps,
            supported: self.supported,
        }
    }
}

/// What happens at one point of the scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioAction {
    /// Estimator sample
    Bandwidth { signal: BandwidthSignal },
    /// Encoder drop report
    FrameDrop { dropped: u32, elapsed_ms: u64 },
    Display { active: bool },
    Audio { active: bool },
    /// Captured content changed
    Source {
        width: u32,
        height: u32,
        fps: u32,
        #[serde(default)]
        video: bool,
    },
    ProtectedContent { active: bool },
    Hdcp { status: HdcpStatus },
    Stream { status: StreamStatus },
    /// Peer left the network
    NetworkLost,
    /// Muxer reports fixed rates from now on
    Muxer { video_kbps: u32, total_kbps: u32 },
    /// Muxer statistics stop being available
    MuxerUnavailable,
    Policy { percent: u8 },
    ForceResolution { enable: bool },
    GameMode { enable: bool },
    /// Renegotiate to a resolution preset id
    Preset { id: u32 },
    ForceIdr,
}

/// An action scheduled relative to session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    /// Offset from session start (milliseconds)
    pub at_ms: u64,
    pub action: ScenarioAction,
}

/// Complete simulator input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Controller tunables
    #[serde(default)]
    pub session: SessionConfig,
    /// Start in the gaming profile
    #[serde(default)]
    pub game_mode: bool,
    /// Format the peer is streaming when the session starts
    pub initial_format: FormatSpec,
    /// Capability list advertised by the peer
    pub peer: Vec<PeerFormat>,
    /// Formats the peer refuses to renegotiate to
    #[serde(default)]
    pub refused: Vec<FormatSpec>,
    /// Timed actions
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
    /// How long to keep running after the last event (milliseconds)
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
}

fn default_settle() -> u64 {
    1_000
}

impl Scenario {
    /// Load a scenario from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a scenario
    pub fn from_toml_str(contents: &str) -> Result<Self, ScenarioError> {
        let mut scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        scenario.events.sort_by_key(|e| e.at_ms);
        Ok(scenario)
    }

    /// Save a scenario to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ScenarioError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ScenarioError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the scenario is runnable
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.peer.is_empty() {
            return Err(ScenarioError::Invalid("peer advertises no formats".into()));
        }
        let initial = self.initial_format.format();
        if !self.peer.iter().any(|p| p.supported && p.to_supported().format == initial) {
            return Err(ScenarioError::Invalid(format!(
                "initial format {} is not supported by the peer",
                initial
            )));
        }
        self.session
            .validate()
            .map_err(|e| ScenarioError::Invalid(e.to_string()))
    }

    /// Capability list for the simulated peer
    pub fn capabilities(&self) -> Vec<SupportedFormat> {
        self.peer.iter().map(PeerFormat::to_supported).collect()
    }

    /// Session config with every delay divided by `speed`
    pub fn scaled_session(&self, speed: u32) -> SessionConfig {
        let speed = u64::from(speed.max(1));
        let scale = |ms: u64| (ms / speed).max(1);
        SessionConfig {
            reenable_buckets_timeout_ms: scale(self.session.reenable_buckets_timeout_ms),
            idle_timeout_ms: scale(self.session.idle_timeout_ms),
            drop_window_ms: scale(self.session.drop_window_ms),
            muxer_poll_interval_ms: scale(self.session.muxer_poll_interval_ms),
            ..self.session.clone()
        }
    }

    /// Example scenario: ramp up, lose the link, recover, go idle
    pub fn example() -> Self {
        let peer = |width, height, fps, default_bitrate_kbps| PeerFormat {
            width,
            height,
            fps,
            default_bitrate_kbps,
            supported: true,
        };
        let at = |at_ms, action| ScenarioEvent { at_ms, action };
        let up = || ScenarioAction::Bandwidth {
            signal: BandwidthSignal::Up,
        };

        let mut events: Vec<ScenarioEvent> = (0..5).map(|i| at(500 + i * 200, up())).collect();
        events.extend([
            at(
                2_000,
                ScenarioAction::Muxer {
                    video_kbps: 9_500,
                    total_kbps: 10_200,
                },
            ),
            at(
                3_000,
                ScenarioAction::Bandwidth {
                    signal: BandwidthSignal::MinUnavailable,
                },
            ),
            at(4_000, ScenarioAction::Policy { percent: 50 }),
            at(
                5_000,
                ScenarioAction::Source {
                    width: 1920,
                    height: 1080,
                    fps: 24,
                    video: true,
                },
            ),
            at(6_000, ScenarioAction::Display { active: false }),
            at(6_000, ScenarioAction::Audio { active: false }),
        ]);

        Scenario {
            session: SessionConfig::default(),
            game_mode: false,
            initial_format: FormatSpec {
                width: 1280,
                height: 720,
                fps: 60,
            },
            peer: vec![
                peer(640, 480, 60, 3_000),
                peer(1280, 720, 30, 5_500),
                peer(1280, 720, 60, 8_000),
                peer(1920, 1080, 24, 8_000),
                peer(1920, 1080, 30, 10_000),
                peer(1920, 1080, 60, 15_000),
            ],
            refused: Vec::new(),
            events,
            settle_ms: 2_000,
        }
    }
}

/// Scenario errors
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid scenario: {0}")]
    Invalid(String),
}
