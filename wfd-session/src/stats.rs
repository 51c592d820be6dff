//! Session statistics snapshot

use crate::connection::{HdcpStatus, MuxerStats};
use wfd_core::{Profile, VideoFormat};

/// Point-in-time view of the controller, published after every message
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Whether the sequencer is processing messages
    pub running: bool,
    /// Active ladder
    pub profile: Profile,
    /// Position in the active ladder
    pub bucket_index: usize,
    /// Floor of the active ladder
    pub min_bucket_index: usize,
    /// Number of buckets in the active ladder
    pub ladder_len: usize,
    /// Buckets currently marked unavailable
    pub unavailable_buckets: usize,
    /// Format last negotiated with the peer
    pub active_format: Option<VideoFormat>,
    /// Video bitrate last requested (kbps)
    pub target_bitrate_kbps: Option<u32>,
    /// Last muxer reading
    pub observed: Option<MuxerStats>,
    /// Consecutive UP samples
    pub up_count: u32,
    /// Consecutive DOWN samples
    pub down_count: u32,
    /// Successful renegotiation hops
    pub renegotiations: u64,
    /// Failed renegotiation attempts
    pub renegotiation_failures: u64,
    /// Frame-drop degrades
    pub degrades: u64,
    /// Automatic adaptation suspended by the application
    pub force_resolution: bool,
    /// Gaming profile requested
    pub gaming: bool,
    /// Stream paused by the connection
    pub paused: bool,
    /// Transmission held back for protected content
    pub content_blocked: bool,
    /// Content protection state
    pub hdcp: HdcpStatus,
    /// Idle disconnect pending
    pub idle_armed: bool,
    /// Muxer statistics polling active
    pub polling: bool,
}

impl SessionStats {
    /// Whether automatic adaptation is currently in effect
    pub fn adapting(&self) -> bool {
        self.running && !self.force_resolution && !self.paused
    }
}
