//! Simulated sink peer

use crate::scenario::{Scenario, ScenarioAction};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use wfd_core::{AudioFormat, ResolutionPreset, SupportedFormat, VideoFormat};
use wfd_session::{
    BandwidthEstimator, ConnectionEvent, DisconnectReason, HdcpStatus, MuxerStats,
    NetworkStatus, RateController, SessionError, SessionHandle, SessionListener, SourceFormat,
    StreamConnection,
};

/// How the simulated muxer answers statistics reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxerMode {
    /// Report the requested video bitrate plus transport overhead
    Follow,
    /// Report fixed rates
    Fixed(MuxerStats),
    /// Reads fail
    Unavailable,
}

/// Transport stream overhead added to the video rate (kbps)
const TS_OVERHEAD_KBPS: u32 = 256;

#[derive(Debug)]
struct PeerState {
    active: Option<VideoFormat>,
    video_bitrate_kbps: u32,
    muxer: MuxerMode,
    paused: bool,
    connected: bool,
    renegotiations: u64,
    refusals: u64,
    idr_requests: u64,
    sink: Option<SessionHandle>,
}

/// In-process stand-in for a wireless display sink
pub struct SimConnection {
    capabilities: Vec<SupportedFormat>,
    refused: Vec<VideoFormat>,
    state: Mutex<PeerState>,
}

impl SimConnection {
    /// Build the peer described by a scenario
    pub fn from_scenario(scenario: &Scenario) -> Arc<Self> {
        let initial = scenario.initial_format.format();
        let bitrate = scenario
            .capabilities()
            .iter()
            .find(|c| c.format == initial)
            .map_or(0, |c| c.default_bitrate_kbps);

        Arc::new(SimConnection {
            capabilities: scenario.capabilities(),
            refused: scenario.refused.iter().map(|f| f.format()).collect(),
            state: Mutex::new(PeerState {
                active: Some(initial),
                video_bitrate_kbps: bitrate,
                muxer: MuxerMode::Follow,
                paused: false,
                connected: true,
                renegotiations: 0,
                refusals: 0,
                idr_requests: 0,
                sink: None,
            }),
        })
    }

    /// Post a notification to the session registered with this peer
    pub fn emit(&self, event: ConnectionEvent) -> Result<(), SessionError> {
        let sink = self.state.lock().sink.clone();
        match sink {
            Some(sink) => sink.post_event(event),
            None => Err(SessionError::NotRunning),
        }
    }

    /// Change how muxer statistics are reported
    pub fn set_muxer(&self, mode: MuxerMode) {
        self.state.lock().muxer = mode;
    }

    /// Format being streamed
    pub fn active(&self) -> Option<VideoFormat> {
        self.state.lock().active
    }

    /// Accepted renegotiations, refused renegotiations
    pub fn renegotiation_counts(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.renegotiations, state.refusals)
    }

    /// Whether the application has torn the transport down
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Whether transmission is paused
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Key frames requested so far
    pub fn idr_requests(&self) -> u64 {
        self.state.lock().idr_requests
    }
}

impl StreamConnection for SimConnection {
    fn renegotiate(&self, format: &VideoFormat, video_bitrate_kbps: u32, _audio: &AudioFormat) -> bool {
        let mut state = self.state.lock();
        if !state.connected || self.refused.contains(format) {
            state.refusals += 1;
            tracing::info!("Peer refused {} at {} kbps", format, video_bitrate_kbps);
            return false;
        }
        state.active = Some(*format);
        state.video_bitrate_kbps = video_bitrate_kbps;
        state.renegotiations += 1;
        tracing::info!("Peer accepted {} at {} kbps", format, video_bitrate_kbps);
        true
    }

    fn set_video_bitrate(&self, video_bitrate_kbps: u32) -> bool {
        self.state.lock().video_bitrate_kbps = video_bitrate_kbps;
        true
    }

    fn active_video_format(&self) -> Option<VideoFormat> {
        self.state.lock().active
    }

    fn active_audio_format(&self) -> Option<AudioFormat> {
        Some(AudioFormat::stereo_48k())
    }

    fn supported_video_formats(&self) -> Vec<SupportedFormat> {
        self.capabilities.clone()
    }

    fn muxer_stats(&self) -> Option<MuxerStats> {
        let state = self.state.lock();
        match state.muxer {
            MuxerMode::Follow => Some(MuxerStats {
                video_bitrate_kbps: state.video_bitrate_kbps,
                total_stream_kbps: state.video_bitrate_kbps + TS_OVERHEAD_KBPS,
            }),
            MuxerMode::Fixed(stats) => Some(stats),
            MuxerMode::Unavailable => None,
        }
    }

    fn force_idr(&self) {
        self.state.lock().idr_requests += 1;
        tracing::debug!("IDR requested");
    }

    fn pause(&self) {
        self.state.lock().paused = true;
    }

    fn resume(&self) {
        self.state.lock().paused = false;
    }

    fn disconnect(&self) {
        let mut state = self.state.lock();
        state.connected = false;
        state.sink = None;
    }

    fn set_event_sink(&self, sink: Option<SessionHandle>) {
        self.state.lock().sink = sink;
    }
}

/// Estimator whose samples come from the scenario; remembers what it was told
#[derive(Debug, Default)]
pub struct SimEstimator {
    reported: Arc<Mutex<Option<u32>>>,
}

impl SimEstimator {
    pub fn new(reported: Arc<Mutex<Option<u32>>>) -> Self {
        SimEstimator { reported }
    }
}

impl BandwidthEstimator for SimEstimator {
    fn start(&mut self, min_mbps: u32, max_mbps: u32, _sink: SessionHandle) -> bool {
        tracing::debug!("Estimator bounds {}..{} Mbps", min_mbps, max_mbps);
        true
    }

    fn update(&mut self, current_mbps: u32) {
        *self.reported.lock() = Some(current_mbps);
    }

    fn stop(&mut self, force: bool) {
        tracing::debug!("Estimator stopped (force={})", force);
    }
}

/// Application side: performs the disconnect the session asks for
pub struct SimListener {
    connection: Arc<SimConnection>,
    disconnect: Arc<Mutex<Option<DisconnectReason>>>,
}

impl SimListener {
    pub fn new(
        connection: Arc<SimConnection>,
        disconnect: Arc<Mutex<Option<DisconnectReason>>>,
    ) -> Self {
        SimListener {
            connection,
            disconnect,
        }
    }
}

impl SessionListener for SimListener {
    fn on_disconnect(&mut self, reason: DisconnectReason) {
        tracing::warn!("Session requested disconnect: {:?}", reason);
        *self.disconnect.lock() = Some(reason);
        self.connection.disconnect();
    }

    fn on_format_changed(&mut self, format: VideoFormat, video_bitrate_kbps: u32) {
        tracing::info!("Streaming {} at {} kbps", format, video_bitrate_kbps);
    }

    fn on_protected_content_blocked(&mut self, blocked: bool) {
        tracing::warn!("Protected content {}", if blocked { "blocked" } else { "unblocked" });
    }

    fn on_hdcp_status(&mut self, status: HdcpStatus) {
        tracing::info!("HDCP {:?}", status);
    }
}

/// Deliver one scenario action to the running session
pub fn apply_action(
    action: &ScenarioAction,
    controller: &RateController,
    peer: &SimConnection,
) -> Result<(), SessionError> {
    match *action {
        ScenarioAction::Bandwidth { signal } => controller.handle()?.post_bandwidth(signal),
        ScenarioAction::FrameDrop {
            dropped,
            elapsed_ms,
        } => peer.emit(ConnectionEvent::FrameDrop {
            dropped,
            elapsed: Duration::from_millis(elapsed_ms),
        }),
        ScenarioAction::Display { active } => peer.emit(ConnectionEvent::DisplayStatus { active }),
        ScenarioAction::Audio { active } => peer.emit(ConnectionEvent::AudioStatus { active }),
        ScenarioAction::Source {
            width,
            height,
            fps,
            video,
        } => peer.emit(ConnectionEvent::SourceFormatChanged(SourceFormat {
            format: VideoFormat::with_fps(width, height, fps),
            is_video: video,
        })),
        ScenarioAction::ProtectedContent { active } => {
            peer.emit(ConnectionEvent::ProtectedContent { active })
        }
        ScenarioAction::Hdcp { status } => peer.emit(ConnectionEvent::Hdcp(status)),
        ScenarioAction::Stream { status } => peer.emit(ConnectionEvent::StreamStatus(status)),
        ScenarioAction::NetworkLost => {
            peer.emit(ConnectionEvent::NetworkStatus(NetworkStatus::Disconnected))
        }
        ScenarioAction::Muxer {
            video_kbps,
            total_kbps,
        } => {
            peer.set_muxer(MuxerMode::Fixed(MuxerStats {
                video_bitrate_kbps: video_kbps,
                total_stream_kbps: total_kbps,
            }));
            Ok(())
        }
        ScenarioAction::MuxerUnavailable => {
            peer.set_muxer(MuxerMode::Unavailable);
            Ok(())
        }
        ScenarioAction::Policy { percent } => controller.update_policy(percent),
        ScenarioAction::ForceResolution { enable } => controller.force_resolution(enable),
        ScenarioAction::GameMode { enable } => controller.set_gaming_mode(enable),
        ScenarioAction::Preset { id } => match ResolutionPreset::from_id(id) {
            Some(preset) => controller.renegotiate_resolution(preset),
            None => {
                tracing::warn!("Unknown resolution preset {}", id);
                Ok(())
            }
        },
        ScenarioAction::ForceIdr => controller.force_idr(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_follows_renegotiation() {
        let scenario = Scenario::example();
        let peer = SimConnection::from_scenario(&scenario);
        let target = VideoFormat::with_fps(1280, 720, 30);

        assert!(peer.renegotiate(&target, 5_500, &AudioFormat::stereo_48k()));
        assert_eq!(peer.active(), Some(target));
        assert_eq!(
            peer.muxer_stats(),
            Some(MuxerStats {
                video_bitrate_kbps: 5_500,
                total_stream_kbps: 5_500 + TS_OVERHEAD_KBPS,
            })
        );
        assert_eq!(peer.renegotiation_counts(), (1, 0));
    }

    #[test]
    fn test_refused_formats() {
        let mut scenario = Scenario::example();
        scenario.refused.push(crate::scenario::FormatSpec {
            width: 1920,
            height: 1080,
            fps: 60,
        });
        let peer = SimConnection::from_scenario(&scenario);

        let refused = VideoFormat::with_fps(1920, 1080, 60);
        assert!(!peer.renegotiate(&refused, 15_000, &AudioFormat::stereo_48k()));
        assert_eq!(peer.active(), Some(VideoFormat::with_fps(1280, 720, 60)));
        assert_eq!(peer.renegotiation_counts(), (0, 1));
    }

    #[test]
    fn test_muxer_modes() {
        let peer = SimConnection::from_scenario(&Scenario::example());
        assert_eq!(peer.muxer_stats().map(|m| m.video_bitrate_kbps), Some(8_000));

        peer.set_muxer(MuxerMode::Unavailable);
        assert_eq!(peer.muxer_stats(), None);
    }

    #[test]
    fn test_emit_without_session() {
        let peer = SimConnection::from_scenario(&Scenario::example());
        assert!(matches!(
            peer.emit(ConnectionEvent::CapabilitiesChanged),
            Err(SessionError::NotRunning)
        ));
    }
}
