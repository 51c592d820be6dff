//! Event sequencer
//!
//! Owns every piece of mutable controller state and processes one
//! [`Message`] at a time to completion. Producers never touch this state;
//! they post messages. Because nothing else can observe the state mid-update,
//! no locking is needed except for publishing the [`SessionStats`] snapshot.

use crate::config::SessionConfig;
use crate::connection::{
    BandwidthEstimator, ConnectionEvent, DisconnectReason, HdcpStatus, MuxerStats,
    NetworkStatus, SessionListener, SourceFormat, StreamConnection, StreamStatus,
};
use crate::controller::SessionHandle;
use crate::message::{Message, PolicyRequest};
use crate::stats::SessionStats;
use crate::timer::{Scheduler, TimerKind, TimerToken, Timers};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wfd_core::{
    estimator_report_mbps, is_rate_starved, BandwidthSignal, DropVerdict, FormatGraph,
    FrameDropDetector, HysteresisAction, HysteresisController, Ladder, Profile,
    ResolutionPreset, SupportedFormat, VideoFormat,
};

/// Whether the message loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Outcome of walking a renegotiation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathOutcome {
    /// Every hop succeeded
    Completed,
    /// Destination unreachable from the active format
    NoRoute,
    /// A hop failed; `reached` is the last format the peer accepted
    Aborted { reached: VideoFormat, hops: usize },
}

/// Single-threaded owner of one session's adaptation state
pub struct Sequencer {
    config: SessionConfig,
    connection: Arc<dyn StreamConnection>,
    estimator: Box<dyn BandwidthEstimator>,
    listener: Box<dyn SessionListener>,
    scheduler: Box<dyn Scheduler>,
    handle: SessionHandle,
    timers: Timers,

    capabilities: Vec<SupportedFormat>,
    graph: FormatGraph,
    ladder: Ladder,
    hysteresis: HysteresisController,
    drops: FrameDropDetector,

    gaming: bool,
    hd_source: bool,
    force_resolution: bool,
    paused: bool,
    display_active: bool,
    audio_active: bool,
    protected_content: bool,
    content_blocked: bool,
    hdcp: HdcpStatus,

    active_format: Option<VideoFormat>,
    target_bitrate_kbps: Option<u32>,
    observed: Option<MuxerStats>,
    poll_failures: u32,

    renegotiations: u64,
    renegotiation_failures: u64,
    degrades: u64,

    stats: Arc<RwLock<SessionStats>>,
    running: bool,
}

impl Sequencer {
    /// Create a sequencer for a configured connection
    ///
    /// Reads the peer's capability list and builds the compatibility graph
    /// and the initial ladder. Nothing is sent to the peer until
    /// [`start`](Self::start).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SessionConfig,
        connection: Arc<dyn StreamConnection>,
        estimator: Box<dyn BandwidthEstimator>,
        listener: Box<dyn SessionListener>,
        scheduler: Box<dyn Scheduler>,
        handle: SessionHandle,
        gaming: bool,
        stats: Arc<RwLock<SessionStats>>,
    ) -> Self {
        let capabilities = connection.supported_video_formats();
        let graph = FormatGraph::build(&capabilities);
        let ladder = Ladder::with_capabilities(Profile::select(gaming, false), &capabilities);
        let hysteresis = HysteresisController::new(config.up_threshold, config.down_threshold);
        let drops = FrameDropDetector::new(config.drop_thresholds());

        Sequencer {
            config,
            connection,
            estimator,
            listener,
            scheduler,
            handle,
            timers: Timers::new(),
            capabilities,
            graph,
            ladder,
            hysteresis,
            drops,
            gaming,
            hd_source: false,
            force_resolution: false,
            paused: false,
            display_active: true,
            audio_active: true,
            protected_content: false,
            content_blocked: false,
            hdcp: HdcpStatus::Unknown,
            active_format: None,
            target_bitrate_kbps: None,
            observed: None,
            poll_failures: 0,
            renegotiations: 0,
            renegotiation_failures: 0,
            degrades: 0,
            stats,
            running: false,
        }
    }

    /// Begin the session
    ///
    /// Registers for connection events, starts the bandwidth estimator,
    /// aligns the ladder with the active format and starts muxer polling.
    pub fn start(&mut self) {
        self.running = true;
        self.connection.set_event_sink(Some(self.handle.clone()));

        if !self.estimator.start(
            self.config.estimator_min_mbps,
            self.config.estimator_max_mbps,
            self.handle.clone(),
        ) {
            tracing::warn!("Bandwidth estimator failed to start, adapting on frame drops only");
        }

        self.active_format = self.connection.active_video_format();
        match self.active_format.and_then(|f| self.ladder.find(&f)) {
            Some(index) if self.ladder.buckets()[index].supported => {
                self.ladder.set_index(index);
                let kbps = self.ladder.current().video_rate_kbps;
                if self.connection.set_video_bitrate(kbps) {
                    self.target_bitrate_kbps = Some(kbps);
                }
            }
            _ => {
                let target = self.ladder.default_valid_index();
                self.switch_to(target);
            }
        }

        tracing::info!(
            "Session started: profile={}, bucket={}/{}, format={:?}",
            self.ladder.profile(),
            self.ladder.index(),
            self.ladder.len(),
            self.active_format
        );

        self.arm(TimerKind::MuxerPoll, self.config.muxer_poll_interval());
        self.publish();
    }

    /// Process one message to completion
    pub fn handle(&mut self, message: Message) -> Flow {
        if !self.running {
            return Flow::Stop;
        }

        let flow = match message {
            Message::Connection(event) => self.on_connection_event(event),
            Message::Bandwidth(signal) => {
                self.on_bandwidth(signal);
                Flow::Continue
            }
            Message::Policy(request) => {
                self.on_policy(request);
                Flow::Continue
            }
            Message::Timer(token) => self.on_timer(token),
            Message::Stop => {
                tracing::info!("Session stop requested");
                self.shutdown(false);
                Flow::Stop
            }
        };

        self.publish();
        flow
    }

    /// Whether the session is still processing messages
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Active ladder
    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    /// Hysteresis counters
    pub fn hysteresis(&self) -> &HysteresisController {
        &self.hysteresis
    }

    /// Compatibility graph for the current capability list
    pub fn graph(&self) -> &FormatGraph {
        &self.graph
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) -> Flow {
        match event {
            ConnectionEvent::NetworkStatus(NetworkStatus::Disconnected) => {
                tracing::warn!("Peer disconnected from the network");
                return self.teardown(DisconnectReason::PeerDisconnected);
            }
            ConnectionEvent::NetworkStatus(NetworkStatus::Connected) => {
                tracing::debug!("Peer network connected");
            }
            ConnectionEvent::SourceFormatChanged(source) => self.on_source_format(source),
            ConnectionEvent::FrameDrop { dropped, elapsed } => {
                return self.on_frame_drop(dropped, elapsed);
            }
            ConnectionEvent::DisplayStatus { active } => {
                self.display_active = active;
                self.update_idle_timer();
            }
            ConnectionEvent::AudioStatus { active } => {
                self.audio_active = active;
                self.update_idle_timer();
            }
            ConnectionEvent::ProtectedContent { active } => {
                self.protected_content = active;
                self.update_content_protection();
            }
            ConnectionEvent::Hdcp(status) => {
                tracing::info!("HDCP status: {:?}", status);
                self.hdcp = status;
                self.listener.on_hdcp_status(status);
                self.update_content_protection();
            }
            ConnectionEvent::RenegotiationResult { success } => {
                self.on_renegotiation_result(success)
            }
            ConnectionEvent::StreamStatus(status) => self.on_stream_status(status),
            ConnectionEvent::CapabilitiesChanged => self.on_capabilities_changed(),
        }
        Flow::Continue
    }

    fn adaptation_suspended(&self) -> bool {
        self.force_resolution || self.paused
    }

    fn on_bandwidth(&mut self, signal: BandwidthSignal) {
        if self.adaptation_suspended() {
            tracing::trace!("Ignoring {:?}, adaptation suspended", signal);
            return;
        }

        let vetoed = signal == BandwidthSignal::Up && self.up_vetoed();
        let action = self.hysteresis.on_signal(signal, vetoed);

        let target = match action {
            HysteresisAction::Hold => None,
            HysteresisAction::Increase => Some(self.ladder.next_higher()),
            HysteresisAction::Decrease => Some(self.ladder.next_lower()),
            // A session parked below the floor is already lower than the floor
            HysteresisAction::ForceLowest => {
                Some(self.ladder.lowest_valid().min(self.ladder.index()))
            }
        };

        if let Some(target) = target {
            if target != self.ladder.index() {
                tracing::info!(
                    "Bandwidth {:?}: bucket {} -> {}",
                    signal,
                    self.ladder.index(),
                    target
                );
                self.switch_to(target);
            } else {
                tracing::debug!("Bandwidth {:?}: no better bucket than {}", signal, target);
            }
        }

        self.report_to_estimator();
    }

    /// Whether the observed outgoing rate makes an UP sample untrustworthy
    fn up_vetoed(&self) -> bool {
        let reference = self.ladder.index().max(self.ladder.default_index());
        let reference_kbps = self
            .ladder
            .get(reference)
            .map_or(0, |bucket| bucket.video_rate_kbps);
        is_rate_starved(
            self.observed.map(|o| o.video_bitrate_kbps),
            reference_kbps,
            self.config.up_veto_ratio,
        )
    }

    fn report_to_estimator(&mut self) {
        let kbps = self
            .observed
            .map(|o| o.total_stream_kbps)
            .or(self.target_bitrate_kbps)
            .unwrap_or_else(|| self.ladder.current().video_rate_kbps);
        self.estimator
            .update(estimator_report_mbps(kbps, self.config.estimator_max_mbps));
    }

    fn on_frame_drop(&mut self, dropped: u32, elapsed: Duration) -> Flow {
        if self.adaptation_suspended() {
            return Flow::Continue;
        }

        // Presets outside the ladder leave the bucket behind the stream
        let fps = self
            .active_format
            .unwrap_or(self.ladder.current().format)
            .frame_rate();

        if self.ladder.at_floor() && self.drops.is_unrecoverable(dropped, elapsed, fps) {
            tracing::error!(
                "Dropped {} frames in {:?} at the lowest quality, giving up",
                dropped,
                elapsed
            );
            return self.teardown(DisconnectReason::Unrecoverable);
        }

        match self.drops.record(dropped, elapsed, fps, Instant::now()) {
            DropVerdict::Sustained => self.degrade(),
            DropVerdict::Recorded if self.timers.is_armed(TimerKind::ReenableBuckets) => {
                tracing::debug!("Frame drops during cooldown, restarting re-enable timer");
                self.arm(
                    TimerKind::ReenableBuckets,
                    self.config.reenable_buckets_timeout(),
                );
            }
            _ => {}
        }
        Flow::Continue
    }

    /// Step down after sustained frame drops and block anything as demanding
    fn degrade(&mut self) {
        self.degrades += 1;
        self.drops.reset();

        let invalidated = self.ladder.invalidate_from_current();
        let target = self.ladder.next_lower();
        tracing::info!(
            "Sustained frame drops at bucket {}: stepping to {}, {} buckets blocked",
            self.ladder.index(),
            target,
            invalidated
        );

        self.arm(
            TimerKind::ReenableBuckets,
            self.config.reenable_buckets_timeout(),
        );

        if target != self.ladder.index() {
            self.switch_to(target);
        }
    }

    fn on_source_format(&mut self, source: SourceFormat) {
        tracing::debug!("Source format changed to {} (video={})", source.format, source.is_video);

        // New content invalidates restrictions learned from the old one
        self.ladder.restore_all();
        self.timers.cancel(TimerKind::ReenableBuckets);
        self.drops.reset();

        self.hd_source = source.is_hd_video();
        if !self.force_resolution {
            self.switch_profile_if_needed();
        }
    }

    /// Swap ladders when the gaming flag or source class selects another one
    ///
    /// If the peer refuses the move and keeps a format the new ladder has no
    /// bucket for, the previous ladder stays in place.
    fn switch_profile_if_needed(&mut self) -> bool {
        let profile = Profile::select(self.gaming, self.hd_source);
        if profile == self.ladder.profile() {
            return false;
        }

        tracing::info!("Switching ladder {} -> {}", self.ladder.profile(), profile);
        let previous = std::mem::replace(
            &mut self.ladder,
            Ladder::with_capabilities(profile, &self.capabilities),
        );
        self.hysteresis.reset();
        self.drops.reset();
        self.timers.cancel(TimerKind::ReenableBuckets);

        // Keep the current format when the new ladder has it, only the bitrate moves
        let active = self.active_format.or_else(|| self.connection.active_video_format());
        let target = match active.and_then(|f| self.ladder.find(&f)) {
            Some(index) if self.ladder.buckets()[index].supported => index,
            _ => self.ladder.default_valid_index(),
        };
        if self.switch_to(target) || self.realign_index() {
            return true;
        }

        tracing::warn!(
            "Peer stayed on {:?}, keeping the {} ladder",
            self.active_format,
            previous.profile()
        );
        self.ladder = previous;
        self.realign_index();
        false
    }

    fn on_policy(&mut self, request: PolicyRequest) {
        match request {
            PolicyRequest::UpdatePolicy(percent) => {
                let target = self.ladder.index_for_percent(percent);
                tracing::info!("Policy {}% selects bucket {}", percent, target);
                self.hysteresis.reset();
                self.switch_to(target);
            }
            PolicyRequest::ForceResolution(enable) => {
                if self.force_resolution == enable {
                    return;
                }
                tracing::info!("Force resolution {}", if enable { "on" } else { "off" });
                self.force_resolution = enable;
                self.hysteresis.reset();
                self.drops.reset();
                if !enable {
                    self.switch_profile_if_needed();
                }
            }
            PolicyRequest::GameMode(enable) => {
                if self.gaming == enable {
                    tracing::debug!("Game mode already {}", enable);
                    return;
                }
                self.gaming = enable;
                self.switch_profile_if_needed();
            }
            PolicyRequest::RenegotiateResolution(preset) => self.renegotiate_preset(preset),
            PolicyRequest::ForceIdr => self.connection.force_idr(),
        }
    }

    fn renegotiate_preset(&mut self, preset: ResolutionPreset) {
        let destination = preset.format();
        if !self.graph.contains(&destination) {
            tracing::warn!("Peer does not support {}", destination);
            return;
        }

        if let Some(index) = self.ladder.find(&destination) {
            self.hysteresis.reset();
            self.switch_to(index);
            return;
        }

        let Some(active) = self.current_format() else {
            tracing::warn!("No active format, cannot renegotiate to {}", destination);
            return;
        };
        let kbps = self.graph.default_bitrate(&destination).unwrap_or(0);
        match self.walk_path(&active, &destination, kbps) {
            PathOutcome::Completed => {
                self.finish_switch(destination, kbps);
            }
            PathOutcome::NoRoute => {
                tracing::warn!("No renegotiation path from {} to {}", active, destination);
            }
            PathOutcome::Aborted { reached, hops } => self.abort_switch(reached, hops),
        }
    }

    fn on_timer(&mut self, token: TimerToken) -> Flow {
        if !self.timers.fire(token) {
            tracing::trace!("Dropping stale {:?} timer", token.kind);
            return Flow::Continue;
        }

        match token.kind {
            TimerKind::ReenableBuckets => {
                tracing::info!("Re-enabling all buckets");
                self.ladder.restore_all();
            }
            TimerKind::IdleDisconnect => {
                tracing::info!("Display and audio idle, requesting disconnect");
                return self.teardown(DisconnectReason::Idle);
            }
            TimerKind::MuxerPoll => self.poll_muxer(),
        }
        Flow::Continue
    }

    fn update_idle_timer(&mut self) {
        if !self.display_active && !self.audio_active {
            if !self.timers.is_armed(TimerKind::IdleDisconnect) {
                tracing::debug!("Display and audio inactive, arming idle timer");
                self.arm(TimerKind::IdleDisconnect, self.config.idle_timeout());
            }
        } else if self.timers.is_armed(TimerKind::IdleDisconnect) {
            tracing::debug!("Output active again, disarming idle timer");
            self.timers.cancel(TimerKind::IdleDisconnect);
        }
    }

    /// Read muxer rates; missing reads back off and eventually stop polling
    fn poll_muxer(&mut self) {
        match self.connection.muxer_stats() {
            Some(stats) => {
                self.observed = Some(stats);
                self.poll_failures = 0;
                self.estimator.update(estimator_report_mbps(
                    stats.total_stream_kbps,
                    self.config.estimator_max_mbps,
                ));
                self.arm(TimerKind::MuxerPoll, self.config.muxer_poll_interval());
            }
            None => {
                self.poll_failures += 1;
                if self.poll_failures > self.config.muxer_poll_max_retries {
                    tracing::warn!(
                        "Muxer statistics unavailable after {} attempts, polling stopped",
                        self.poll_failures
                    );
                    self.observed = None;
                    return;
                }
                let backoff = self
                    .config
                    .muxer_poll_interval()
                    .checked_mul(1u32 << self.poll_failures.min(16))
                    .unwrap_or(Duration::MAX);
                tracing::debug!("Muxer statistics unavailable, retrying in {:?}", backoff);
                self.arm(TimerKind::MuxerPoll, backoff);
            }
        }
    }

    fn update_content_protection(&mut self) {
        let must_block = self.protected_content && self.hdcp != HdcpStatus::Authenticated;
        if must_block && !self.content_blocked {
            tracing::warn!("Protected content without HDCP ({:?}), pausing", self.hdcp);
            self.connection.pause();
            self.content_blocked = true;
            self.listener.on_protected_content_blocked(true);
        } else if !must_block && self.content_blocked {
            tracing::info!("Protected content cleared, resuming");
            self.connection.resume();
            self.content_blocked = false;
            self.listener.on_protected_content_blocked(false);
        }
    }

    fn on_stream_status(&mut self, status: StreamStatus) {
        let paused = status == StreamStatus::Paused;
        if paused == self.paused {
            return;
        }
        tracing::debug!("Stream {:?}", status);
        self.paused = paused;
        self.hysteresis.reset();
        self.drops.reset();
    }

    fn on_renegotiation_result(&mut self, success: bool) {
        if success {
            return;
        }
        self.renegotiation_failures += 1;
        self.active_format = self.connection.active_video_format();
        if self.realign_index() {
            tracing::warn!(
                "Peer rejected renegotiation, realigned to bucket {}",
                self.ladder.index()
            );
        }
    }

    /// Point the ladder at the bucket the peer is actually streaming
    fn realign_index(&mut self) -> bool {
        match self.active_format.and_then(|f| self.ladder.find(&f)) {
            Some(index) => {
                self.ladder.set_index(index);
                true
            }
            None => false,
        }
    }

    fn on_capabilities_changed(&mut self) {
        self.capabilities = self.connection.supported_video_formats();
        self.graph = FormatGraph::build(&self.capabilities);
        self.ladder.apply_capabilities(&self.capabilities);
        tracing::info!(
            "Peer capabilities changed: {} formats, floor {}",
            self.graph.len(),
            self.ladder.min_index()
        );

        if !self.ladder.current().supported {
            let target = self.ladder.default_valid_index();
            self.switch_to(target);
        }
    }

    fn current_format(&mut self) -> Option<VideoFormat> {
        if self.active_format.is_none() {
            self.active_format = self.connection.active_video_format();
        }
        self.active_format
    }

    /// Move the session to a ladder bucket
    ///
    /// Returns false when the move failed or was impossible; the session
    /// stays at whatever format the peer last accepted.
    fn switch_to(&mut self, target: usize) -> bool {
        let Some(bucket) = self.ladder.get(target).copied() else {
            return false;
        };
        self.hysteresis.reset();

        let Some(active) = self.current_format() else {
            tracing::warn!("No active video format, cannot move to bucket {}", target);
            self.renegotiation_failures += 1;
            return false;
        };

        if active == bucket.format {
            self.ladder.set_index(target);
            if self.target_bitrate_kbps == Some(bucket.video_rate_kbps) {
                return true;
            }
            if self.connection.set_video_bitrate(bucket.video_rate_kbps) {
                tracing::debug!("Bitrate set to {} kbps", bucket.video_rate_kbps);
                self.target_bitrate_kbps = Some(bucket.video_rate_kbps);
                return true;
            }
            self.renegotiation_failures += 1;
            return false;
        }

        match self.walk_path(&active, &bucket.format, bucket.video_rate_kbps) {
            PathOutcome::Completed => {
                self.ladder.set_index(target);
                self.finish_switch(bucket.format, bucket.video_rate_kbps);
                true
            }
            PathOutcome::NoRoute => {
                tracing::debug!("No renegotiation path from {} to {}", active, bucket.format);
                false
            }
            PathOutcome::Aborted { reached, hops } => {
                self.abort_switch(reached, hops);
                false
            }
        }
    }

    /// Issue one renegotiation per hop, final hop at `final_kbps`
    fn walk_path(&mut self, from: &VideoFormat, to: &VideoFormat, final_kbps: u32) -> PathOutcome {
        let path = self.graph.shortest_path(from, to);
        if path.len() < 2 {
            return PathOutcome::NoRoute;
        }

        let last = path.len() - 1;
        for (step, hop) in path.iter().enumerate().skip(1) {
            let kbps = if step == last {
                final_kbps
            } else {
                self.graph.default_bitrate(hop).unwrap_or(final_kbps)
            };

            let Some(audio) = self.connection.active_audio_format() else {
                tracing::warn!("Audio format unavailable, aborting renegotiation at {}", hop);
                return PathOutcome::Aborted {
                    reached: path[step - 1],
                    hops: step - 1,
                };
            };

            if !self.connection.renegotiate(hop, kbps, &audio) {
                tracing::warn!("Peer refused {} at {} kbps", hop, kbps);
                return PathOutcome::Aborted {
                    reached: path[step - 1],
                    hops: step - 1,
                };
            }

            tracing::debug!("Renegotiated hop {}/{}: {} at {} kbps", step, last, hop, kbps);
            self.renegotiations += 1;
            self.active_format = Some(*hop);
            self.target_bitrate_kbps = Some(kbps);
        }

        PathOutcome::Completed
    }

    fn finish_switch(&mut self, format: VideoFormat, kbps: u32) {
        tracing::info!("Now streaming {} at {} kbps", format, kbps);
        self.listener.on_format_changed(format, kbps);
        if !self.timers.is_armed(TimerKind::MuxerPoll) {
            self.poll_failures = 0;
            self.arm(TimerKind::MuxerPoll, self.config.muxer_poll_interval());
        }
    }

    /// Keep whatever intermediate format the peer accepted
    fn abort_switch(&mut self, reached: VideoFormat, hops: usize) {
        self.renegotiation_failures += 1;
        if hops == 0 {
            return;
        }
        if !self.realign_index() {
            tracing::debug!("{} has no bucket in the {} ladder", reached, self.ladder.profile());
        }
        let kbps = self.target_bitrate_kbps.unwrap_or(0);
        tracing::warn!("Renegotiation stopped at {} after {} hops", reached, hops);
        self.listener.on_format_changed(reached, kbps);
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration) {
        let token = self.timers.arm(kind);
        self.scheduler.schedule(token, delay);
    }

    fn teardown(&mut self, reason: DisconnectReason) -> Flow {
        self.listener.on_disconnect(reason);
        self.shutdown(true);
        Flow::Stop
    }

    /// Flush timers and release collaborators; further messages are refused
    fn shutdown(&mut self, force: bool) {
        if !self.running {
            return;
        }
        self.running = false;
        self.timers.cancel_all();
        self.estimator.stop(force);
        self.connection.set_event_sink(None);
    }

    fn publish(&self) {
        let mut stats = self.stats.write();
        stats.running = self.running;
        stats.profile = self.ladder.profile();
        stats.bucket_index = self.ladder.index();
        stats.min_bucket_index = self.ladder.min_index();
        stats.ladder_len = self.ladder.len();
        stats.unavailable_buckets = self.ladder.unavailable_count();
        stats.active_format = self.active_format;
        stats.target_bitrate_kbps = self.target_bitrate_kbps;
        stats.observed = self.observed;
        stats.up_count = self.hysteresis.up_count();
        stats.down_count = self.hysteresis.down_count();
        stats.renegotiations = self.renegotiations;
        stats.renegotiation_failures = self.renegotiation_failures;
        stats.degrades = self.degrades;
        stats.force_resolution = self.force_resolution;
        stats.gaming = self.gaming;
        stats.paused = self.paused;
        stats.content_blocked = self.content_blocked;
        stats.hdcp = self.hdcp;
        stats.idle_armed = self.timers.is_armed(TimerKind::IdleDisconnect);
        stats.polling = self.timers.is_armed(TimerKind::MuxerPoll);
    }
}
