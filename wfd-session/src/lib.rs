//! Wireless Display Rate Control Session
//!
//! Runtime half of the controller: collaborator traits, the message-driven
//! sequencer, lifecycle timers, and the [`RateController`] the owning
//! application talks to.
//!
//! # Concurrency
//!
//! Each session runs one sequencer thread. Bandwidth estimator callbacks,
//! connection notifications, timers and application requests all become
//! [`Message`]s on its queue and are processed one at a time.

pub mod config;
pub mod connection;
pub mod controller;
pub mod error;
pub mod message;
pub mod sequencer;
pub mod stats;
pub mod timer;

pub use config::{ConfigError, SessionConfig, MAX_MUXER_POLL_INTERVAL_MS};
pub use connection::{
    BandwidthEstimator, ConnectionEvent, DisconnectReason, HdcpStatus, MuxerStats,
    NetworkStatus, NoopEstimator, SessionListener, SourceFormat, StreamConnection,
    StreamStatus,
};
pub use controller::{RateController, SessionHandle};
pub use error::SessionError;
pub use message::{Message, PolicyRequest};
pub use sequencer::{Flow, Sequencer};
pub use stats::SessionStats;
pub use timer::{Scheduler, ThreadScheduler, TimerKind, TimerToken, Timers};
