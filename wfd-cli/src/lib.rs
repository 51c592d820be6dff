//! WFD CLI Library
//!
//! Shared functionality for the session simulator.

pub mod scenario;
pub mod sim;
pub mod stats;

pub use scenario::{FormatSpec, PeerFormat, Scenario, ScenarioAction, ScenarioError, ScenarioEvent};
pub use sim::{apply_action, MuxerMode, SimConnection, SimEstimator, SimListener};
pub use stats::{display_compact_stats, display_session_stats, format_bandwidth, format_duration};
