//! Collaborator interfaces
//!
//! The controller never touches transport, encoder or UI directly. It calls
//! into these traits and receives their notifications as [`ConnectionEvent`]
//! messages through a [`SessionHandle`](crate::SessionHandle).

use crate::controller::SessionHandle;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wfd_core::{AudioFormat, SupportedFormat, VideoFormat};

/// Outgoing rates reported by the muxer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MuxerStats {
    /// Video elementary stream rate (kbps)
    pub video_bitrate_kbps: u32,
    /// Whole transport stream rate (kbps)
    pub total_stream_kbps: u32,
}

/// Streaming connection to the sink
///
/// Implementations must not block: each call is made from the session's
/// sequencer thread and long operations stall every other signal.
pub trait StreamConnection: Send + Sync {
    /// Ask the peer to switch to `format` at `video_bitrate_kbps`
    fn renegotiate(
        &self,
        format: &VideoFormat,
        video_bitrate_kbps: u32,
        audio: &AudioFormat,
    ) -> bool;

    /// Change only the encoder bitrate
    fn set_video_bitrate(&self, video_bitrate_kbps: u32) -> bool;

    /// Format currently being streamed
    fn active_video_format(&self) -> Option<VideoFormat>;

    /// Audio format currently being streamed
    fn active_audio_format(&self) -> Option<AudioFormat>;

    /// Capability list advertised by the peer
    fn supported_video_formats(&self) -> Vec<SupportedFormat>;

    /// Current muxer output rates
    fn muxer_stats(&self) -> Option<MuxerStats>;

    /// Request an immediate key frame
    fn force_idr(&self);

    /// Suspend transmission
    fn pause(&self);

    /// Resume transmission
    fn resume(&self);

    /// Tear down the transport
    fn disconnect(&self);

    /// Register where connection events should be posted
    ///
    /// Called with `Some` when a session starts and `None` when it ends.
    fn set_event_sink(&self, _sink: Option<SessionHandle>) {}
}

/// Bandwidth estimator driving UP/DOWN signals
pub trait BandwidthEstimator: Send {
    /// Start estimating between the given bounds; signals go to `sink`
    fn start(&mut self, min_mbps: u32, max_mbps: u32, sink: SessionHandle) -> bool;

    /// Report the currently observed outgoing rate
    fn update(&mut self, current_mbps: u32);

    /// Stop estimating
    fn stop(&mut self, force: bool);
}

/// Estimator that never produces signals
#[derive(Debug, Default)]
pub struct NoopEstimator;

impl BandwidthEstimator for NoopEstimator {
    fn start(&mut self, _min_mbps: u32, _max_mbps: u32, _sink: SessionHandle) -> bool {
        true
    }

    fn update(&mut self, _current_mbps: u32) {}

    fn stop(&mut self, _force: bool) {}
}

/// Why the session asks the application to disconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer dropped off the network
    PeerDisconnected,
    /// No display or audio output for the idle grace period
    Idle,
    /// Frames are being dropped even at the lowest quality
    Unrecoverable,
}

/// Application callbacks
///
/// Only `on_disconnect` is mandatory; the application performs the actual
/// disconnection.
pub trait SessionListener: Send {
    /// The session cannot continue
    fn on_disconnect(&mut self, reason: DisconnectReason);

    /// A renegotiation completed
    fn on_format_changed(&mut self, _format: VideoFormat, _video_bitrate_kbps: u32) {}

    /// Transmission was paused or resumed because of protected content
    fn on_protected_content_blocked(&mut self, _blocked: bool) {}

    /// HDCP status changed
    fn on_hdcp_status(&mut self, _status: HdcpStatus) {}
}

/// Peer network reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Connected,
    Disconnected,
}

/// Content protection handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HdcpStatus {
    #[default]
    Unknown,
    Authenticated,
    Failed,
    Unsupported,
}

/// Whether the stream is flowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Playing,
    Paused,
}

/// Description of the content being captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFormat {
    /// Native format of the source
    pub format: VideoFormat,
    /// Whether the source is a video stream rather than UI content
    pub is_video: bool,
}

impl SourceFormat {
    /// Whether this source selects the HD playback ladder
    pub fn is_hd_video(&self) -> bool {
        self.is_video && self.format.is_full_hd()
    }
}

/// Notification from the connection collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionEvent {
    /// Peer reachability changed
    NetworkStatus(NetworkStatus),
    /// Captured content changed
    SourceFormatChanged(SourceFormat),
    /// Encoder dropped frames over an interval
    FrameDrop { dropped: u32, elapsed: Duration },
    /// Display output became active or inactive
    DisplayStatus { active: bool },
    /// Audio output became active or inactive
    AudioStatus { active: bool },
    /// Protected content started or stopped
    ProtectedContent { active: bool },
    /// Asynchronous outcome of a renegotiation
    RenegotiationResult { success: bool },
    /// Content protection state changed
    Hdcp(HdcpStatus),
    /// Stream paused or resumed
    StreamStatus(StreamStatus),
    /// Peer capability list changed
    CapabilitiesChanged,
}
