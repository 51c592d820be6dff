//! Shared fixtures for the integration tests
//!
//! A scripted peer, estimator and listener that record what the session asks
//! of them, plus a polling helper for threaded scenarios.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use wfd_core::{AudioFormat, BandwidthSignal, SupportedFormat, VideoFormat};
use wfd_session::{
    BandwidthEstimator, ConnectionEvent, DisconnectReason, MuxerStats, SessionError,
    SessionHandle, SessionListener, StreamConnection,
};

pub const P480_60: VideoFormat = VideoFormat::with_fps(640, 480, 60);
pub const P720_30: VideoFormat = VideoFormat::with_fps(1280, 720, 30);
pub const P720_60: VideoFormat = VideoFormat::with_fps(1280, 720, 60);
pub const P1080_24: VideoFormat = VideoFormat::with_fps(1920, 1080, 24);
pub const P1080_30: VideoFormat = VideoFormat::with_fps(1920, 1080, 30);
pub const P1080_60: VideoFormat = VideoFormat::with_fps(1920, 1080, 60);

/// A peer supporting every built-in ladder format
pub fn full_capabilities() -> Vec<SupportedFormat> {
    vec![
        SupportedFormat::new(P480_60, 3_000),
        SupportedFormat::new(P720_30, 5_500),
        SupportedFormat::new(P720_60, 8_000),
        SupportedFormat::new(P1080_24, 8_000),
        SupportedFormat::new(P1080_30, 10_000),
        SupportedFormat::new(P1080_60, 15_000),
    ]
}

#[derive(Debug, Default)]
struct MockState {
    active: Option<VideoFormat>,
    renegotiations: Vec<(VideoFormat, u32)>,
    bitrates: Vec<u32>,
    muxer: Option<MuxerStats>,
    sink: Option<SessionHandle>,
    disconnected: bool,
}

/// Peer that accepts every renegotiation and logs it
pub struct MockConnection {
    capabilities: Vec<SupportedFormat>,
    state: Mutex<MockState>,
}

impl MockConnection {
    pub fn new(capabilities: Vec<SupportedFormat>, active: VideoFormat) -> Arc<Self> {
        Arc::new(MockConnection {
            capabilities,
            state: Mutex::new(MockState {
                active: Some(active),
                ..MockState::default()
            }),
        })
    }

    /// Renegotiations accepted so far
    pub fn renegotiations(&self) -> Vec<(VideoFormat, u32)> {
        self.state.lock().renegotiations.clone()
    }

    /// Bitrate-only changes so far
    pub fn bitrates(&self) -> Vec<u32> {
        self.state.lock().bitrates.clone()
    }

    pub fn active(&self) -> Option<VideoFormat> {
        self.state.lock().active
    }

    pub fn set_muxer(&self, stats: Option<MuxerStats>) {
        self.state.lock().muxer = stats;
    }

    /// Post a notification the way a connection's listener thread would
    pub fn emit(&self, event: ConnectionEvent) -> Result<(), SessionError> {
        let sink = self.state.lock().sink.clone();
        sink.ok_or(SessionError::NotRunning)?.post_event(event)
    }

    /// Whether a session is registered for events
    pub fn has_sink(&self) -> bool {
        self.state.lock().sink.is_some()
    }

    pub fn is_disconnected(&self) -> bool {
        self.state.lock().disconnected
    }
}

impl StreamConnection for MockConnection {
    fn renegotiate(&self, format: &VideoFormat, kbps: u32, _audio: &AudioFormat) -> bool {
        let mut state = self.state.lock();
        state.renegotiations.push((*format, kbps));
        state.active = Some(*format);
        true
    }

    fn set_video_bitrate(&self, kbps: u32) -> bool {
        self.state.lock().bitrates.push(kbps);
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
        self.state.lock().muxer
    }

    fn force_idr(&self) {}

    fn pause(&self) {}

    fn resume(&self) {}

    fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }

    fn set_event_sink(&self, sink: Option<SessionHandle>) {
        self.state.lock().sink = sink;
    }
}

/// Estimator driven by the test; keeps the handle it was started with
#[derive(Clone, Default)]
pub struct ScriptedEstimator {
    inner: Arc<Mutex<EstimatorState>>,
}

#[derive(Default)]
struct EstimatorState {
    sink: Option<SessionHandle>,
    reports: Vec<u32>,
    stopped: Option<bool>,
}

impl ScriptedEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a sample as the estimator's callback thread would
    pub fn signal(&self, signal: BandwidthSignal) -> Result<(), SessionError> {
        let sink = self.inner.lock().sink.clone();
        sink.ok_or(SessionError::NotRunning)?.post_bandwidth(signal)
    }

    /// Whether a session has started this estimator
    pub fn is_started(&self) -> bool {
        self.inner.lock().sink.is_some()
    }

    pub fn reports(&self) -> Vec<u32> {
        self.inner.lock().reports.clone()
    }

    /// `Some(force)` once stopped
    pub fn stopped(&self) -> Option<bool> {
        self.inner.lock().stopped
    }
}

impl BandwidthEstimator for ScriptedEstimator {
    fn start(&mut self, _min_mbps: u32, _max_mbps: u32, sink: SessionHandle) -> bool {
        self.inner.lock().sink = Some(sink);
        true
    }

    fn update(&mut self, current_mbps: u32) {
        self.inner.lock().reports.push(current_mbps);
    }

    fn stop(&mut self, force: bool) {
        let mut inner = self.inner.lock();
        inner.stopped = Some(force);
        inner.sink = None;
    }
}

/// Listener recording disconnect requests and format changes
#[derive(Clone, Default)]
pub struct RecordingListener {
    disconnects: Arc<Mutex<Vec<DisconnectReason>>>,
    formats: Arc<Mutex<Vec<(VideoFormat, u32)>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disconnects(&self) -> Vec<DisconnectReason> {
        self.disconnects.lock().clone()
    }

    pub fn formats(&self) -> Vec<(VideoFormat, u32)> {
        self.formats.lock().clone()
    }
}

impl SessionListener for RecordingListener {
    fn on_disconnect(&mut self, reason: DisconnectReason) {
        self.disconnects.lock().push(reason);
    }

    fn on_format_changed(&mut self, format: VideoFormat, kbps: u32) {
        self.formats.lock().push((format, kbps));
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
