//! Sequencer inbound messages

use crate::connection::ConnectionEvent;
use crate::timer::TimerToken;
use wfd_core::{BandwidthSignal, ResolutionPreset};

/// Explicit request from the owning application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRequest {
    /// Jump to the bucket mapped from a 0..=100 percentage
    UpdatePolicy(u8),
    /// Suspend or resume automatic adaptation
    ForceResolution(bool),
    /// Enter or leave the gaming profile
    GameMode(bool),
    /// Move to a user-chosen format through the path finder
    RenegotiateResolution(ResolutionPreset),
    /// Ask the encoder for a key frame
    ForceIdr,
}

/// Everything the sequencer processes, one at a time
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Notification from the connection collaborator
    Connection(ConnectionEvent),
    /// Sample from the bandwidth estimator
    Bandwidth(BandwidthSignal),
    /// Request from the application
    Policy(PolicyRequest),
    /// A delayed action came due
    Timer(TimerToken),
    /// End the session
    Stop,
}

impl From<ConnectionEvent> for Message {
    fn from(event: ConnectionEvent) -> Self {
        Message::Connection(event)
    }
}

impl From<BandwidthSignal> for Message {
    fn from(signal: BandwidthSignal) -> Self {
        Message::Bandwidth(signal)
    }
}

impl From<PolicyRequest> for Message {
    fn from(request: PolicyRequest) -> Self {
        Message::Policy(request)
    }
}
