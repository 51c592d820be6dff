//! Wireless Display Rate Control Core
//!
//! This crate implements the decision logic of the adaptive streaming-quality
//! controller: video formats and the single-axis compatibility graph, bitrate
//! ladders, the frame-drop detector, and bandwidth hysteresis. Nothing here
//! performs I/O or owns threads.

pub mod format;
pub mod frame_drop;
pub mod graph;
pub mod hysteresis;
pub mod ladder;

pub use format::{AudioFormat, ResolutionPreset, SupportedFormat, VideoFormat};
pub use frame_drop::{DropThresholds, DropVerdict, FrameDropDetector, DROP_RING_SIZE};
pub use graph::FormatGraph;
pub use hysteresis::{
    estimator_report_mbps, is_rate_starved, BandwidthSignal, HysteresisAction,
    HysteresisController, DOWN_THRESHOLD, UP_THRESHOLD,
};
pub use ladder::{Bucket, Ladder, LadderError, Profile};
