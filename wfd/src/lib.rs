//! WFD Rate - adaptive streaming quality for wireless display sessions
//!
//! High-level API over the decision core and the session runtime.

pub use wfd_core as engine;
pub use wfd_session as session;

// Re-export commonly used types
pub use engine::{BandwidthSignal, Profile, ResolutionPreset, SupportedFormat, VideoFormat};
pub use session::{
    BandwidthEstimator, ConnectionEvent, DisconnectReason, RateController, SessionConfig,
    SessionError, SessionHandle, SessionListener, SessionStats, StreamConnection,
};
