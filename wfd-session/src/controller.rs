//! Application-facing controller
//!
//! [`RateController`] owns the session lifecycle: it spawns the sequencer
//! thread, hands out [`SessionHandle`]s for producers, and exposes the
//! explicit policy requests. Every request is a message; nothing here touches
//! adaptation state directly.

use crate::config::SessionConfig;
use crate::connection::{BandwidthEstimator, ConnectionEvent, SessionListener, StreamConnection};
use crate::error::SessionError;
use crate::message::{Message, PolicyRequest};
use crate::sequencer::{Flow, Sequencer};
use crate::stats::SessionStats;
use crate::timer::ThreadScheduler;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use wfd_core::{BandwidthSignal, Ladder, Profile, ResolutionPreset, VideoFormat};

/// Cloneable entry point into a session's message queue
///
/// Collaborator threads post their notifications here instead of touching
/// session state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Sender<Message>,
}

impl SessionHandle {
    /// Wrap the sending side of a session queue
    pub fn new(tx: Sender<Message>) -> Self {
        SessionHandle { tx }
    }

    /// Enqueue a message
    pub fn post(&self, message: impl Into<Message>) -> Result<(), SessionError> {
        self.tx.send(message.into()).map_err(|_| SessionError::Closed)
    }

    /// Enqueue a connection notification
    pub fn post_event(&self, event: ConnectionEvent) -> Result<(), SessionError> {
        self.post(event)
    }

    /// Enqueue a bandwidth estimator sample
    pub fn post_bandwidth(&self, signal: BandwidthSignal) -> Result<(), SessionError> {
        self.post(signal)
    }

    /// Enqueue an application request
    pub fn post_policy(&self, request: PolicyRequest) -> Result<(), SessionError> {
        self.post(request)
    }
}

struct RunningSession {
    handle: SessionHandle,
    worker: Option<JoinHandle<()>>,
}

impl RunningSession {
    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Sequencer thread panicked");
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }
}

/// Adaptive streaming-quality controller for one sink connection
pub struct RateController {
    config: SessionConfig,
    connection: Option<Arc<dyn StreamConnection>>,
    estimator: Option<Box<dyn BandwidthEstimator>>,
    session: Option<RunningSession>,
    stats: Arc<RwLock<SessionStats>>,
}

impl RateController {
    /// Create an unconfigured controller
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(RateController {
            config,
            connection: None,
            estimator: None,
            session: None,
            stats: Arc::new(RwLock::new(SessionStats::default())),
        })
    }

    /// Attach the collaborators for the next session
    ///
    /// A running session is stopped first. The estimator is consumed by the
    /// next [`start`](Self::start), so each session needs its own configure.
    pub fn configure(
        &mut self,
        connection: Arc<dyn StreamConnection>,
        estimator: Box<dyn BandwidthEstimator>,
    ) {
        if self.session.is_some() {
            let _ = self.stop();
        }
        self.connection = Some(connection);
        self.estimator = Some(estimator);
    }

    /// Start adapting; `listener` receives disconnect requests
    pub fn start(
        &mut self,
        listener: Box<dyn SessionListener>,
        game_mode: bool,
    ) -> Result<(), SessionError> {
        if let Some(session) = &self.session {
            if !session.is_finished() {
                return Err(SessionError::AlreadyRunning);
            }
        }
        if let Some(mut finished) = self.session.take() {
            finished.join();
        }

        let connection = self.connection.clone().ok_or(SessionError::NotConfigured)?;
        let estimator = self.estimator.take().ok_or(SessionError::NotConfigured)?;

        let (tx, rx) = channel::unbounded();
        let handle = SessionHandle::new(tx.clone());
        let scheduler = ThreadScheduler::spawn(tx)?;

        *self.stats.write() = SessionStats::default();
        let sequencer = Sequencer::new(
            self.config.clone(),
            connection,
            estimator,
            listener,
            Box::new(scheduler),
            handle.clone(),
            game_mode,
            Arc::clone(&self.stats),
        );

        let worker = thread::Builder::new()
            .name("wfd-sequencer".to_string())
            .spawn(move || run(sequencer, rx))?;

        tracing::info!("Rate controller started (game_mode={})", game_mode);
        self.session = Some(RunningSession {
            handle,
            worker: Some(worker),
        });
        Ok(())
    }

    /// Stop the session and wait for the sequencer to drain
    pub fn stop(&mut self) -> Result<(), SessionError> {
        let mut session = self.session.take().ok_or(SessionError::NotRunning)?;
        // The sequencer may already have torn itself down
        let _ = session.handle.post(Message::Stop);
        session.join();
        tracing::info!("Rate controller stopped");
        Ok(())
    }

    /// Whether a session is processing messages
    pub fn is_running(&self) -> bool {
        self.session.as_ref().map_or(false, |s| !s.is_finished())
    }

    /// Handle for posting into the running session
    pub fn handle(&self) -> Result<SessionHandle, SessionError> {
        self.session
            .as_ref()
            .map(|s| s.handle.clone())
            .ok_or(SessionError::NotRunning)
    }

    /// Latest statistics snapshot
    pub fn stats(&self) -> SessionStats {
        self.stats.read().clone()
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Jump to the bucket mapped from `percent`, bypassing hysteresis
    pub fn update_policy(&self, percent: u8) -> Result<(), SessionError> {
        if percent > 100 {
            return Err(SessionError::InvalidPolicy(percent));
        }
        self.request(PolicyRequest::UpdatePolicy(percent))
    }

    /// Suspend or resume automatic adaptation
    pub fn force_resolution(&self, enable: bool) -> Result<(), SessionError> {
        self.request(PolicyRequest::ForceResolution(enable))
    }

    /// Enter or leave the gaming ladder
    pub fn set_gaming_mode(&self, enable: bool) -> Result<(), SessionError> {
        self.request(PolicyRequest::GameMode(enable))
    }

    /// Move to a user-chosen preset through the path finder
    pub fn renegotiate_resolution(&self, preset: ResolutionPreset) -> Result<(), SessionError> {
        self.request(PolicyRequest::RenegotiateResolution(preset))
    }

    /// Ask the encoder for a key frame
    pub fn force_idr(&self) -> Result<(), SessionError> {
        self.request(PolicyRequest::ForceIdr)
    }

    /// Format a new session would start at
    ///
    /// Filtered by the configured peer's capabilities when a connection is
    /// attached.
    pub fn default_video_format(&self, game_mode: bool) -> VideoFormat {
        let profile = Profile::select(game_mode, false);
        let ladder = match &self.connection {
            Some(connection) => {
                Ladder::with_capabilities(profile, &connection.supported_video_formats())
            }
            None => Ladder::for_profile(profile),
        };
        ladder.current().format
    }

    fn request(&self, request: PolicyRequest) -> Result<(), SessionError> {
        self.handle()?.post_policy(request)
    }
}

impl Drop for RateController {
    fn drop(&mut self) {
        if self.session.is_some() {
            let _ = self.stop();
        }
    }
}

fn run(mut sequencer: Sequencer, rx: Receiver<Message>) {
    sequencer.start();
    while let Ok(message) = rx.recv() {
        if sequencer.handle(message) == Flow::Stop {
            break;
        }
    }
    tracing::debug!("Sequencer loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_reports_closed_queue() {
        let (tx, rx) = channel::unbounded();
        let handle = SessionHandle::new(tx);
        assert!(handle.post_bandwidth(BandwidthSignal::Up).is_ok());
        assert_eq!(rx.try_recv().unwrap(), Message::Bandwidth(BandwidthSignal::Up));

        drop(rx);
        assert!(matches!(
            handle.post(Message::Stop),
            Err(SessionError::Closed)
        ));
    }

    #[test]
    fn test_requests_need_running_session() {
        let controller = RateController::new(SessionConfig::default()).unwrap();
        assert!(!controller.is_running());
        assert!(matches!(
            controller.force_idr(),
            Err(SessionError::NotRunning)
        ));
    }

    #[test]
    fn test_start_without_configure() {
        struct Quiet;
        impl SessionListener for Quiet {
            fn on_disconnect(&mut self, _reason: crate::DisconnectReason) {}
        }

        let mut controller = RateController::new(SessionConfig::default()).unwrap();
        assert!(matches!(
            controller.start(Box::new(Quiet), false),
            Err(SessionError::NotConfigured)
        ));
        assert!(matches!(controller.stop(), Err(SessionError::NotRunning)));
    }

    #[test]
    fn test_policy_range_checked() {
        let controller = RateController::new(SessionConfig::default()).unwrap();
        assert!(matches!(
            controller.update_policy(101),
            Err(SessionError::InvalidPolicy(101))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig {
            up_threshold: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            RateController::new(config),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn test_default_video_format_without_connection() {
        let controller = RateController::new(SessionConfig::default()).unwrap();
        assert_eq!(
            controller.default_video_format(false),
            VideoFormat::with_fps(1280, 720, 60)
        );
        assert_eq!(
            controller.default_video_format(true),
            VideoFormat::with_fps(1280, 720, 60)
        );
    }
}
