//! Statistics display and formatting

use std::io::Write;
use std::time::Duration;
use wfd_session::SessionStats;

/// Format a bitrate given in kbps
pub fn format_bandwidth(kbps: u64) -> String {
    const MBPS: u64 = 1000;
    const GBPS: u64 = MBPS * 1000;

    if kbps >= GBPS {
        format!("{:.2} Gbps", kbps as f64 / GBPS as f64)
    } else if kbps >= MBPS {
        format!("{:.2} Mbps", kbps as f64 / MBPS as f64)
    } else {
        format!("{} Kbps", kbps)
    }
}

/// Format duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else if secs > 0 {
        format!("{}s", seconds)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

fn optional_rate(kbps: Option<u32>) -> String {
    kbps.map_or_else(|| "N/A".to_string(), |k| format_bandwidth(u64::from(k)))
}

/// Display session statistics
pub fn display_session_stats(stats: &SessionStats, elapsed: Duration) {
    let format = stats
        .active_format
        .map_or_else(|| "none".to_string(), |f| f.to_string());

    println!("\n┌─────────────────────────────────────────────────────────────┐");
    println!("│ SESSION STATISTICS                                          │");
    println!("├─────────────────────────────────────────────────────────────┤");
    println!(
        "│ State: {}{}{}",
        if stats.running { "running" } else { "stopped" },
        if stats.paused { ", paused" } else { "" },
        if stats.content_blocked { ", content blocked" } else { "" }
    );
    println!("│ Elapsed: {}", format_duration(elapsed));
    println!(
        "│ Profile: {}{}",
        stats.profile,
        if stats.force_resolution { " (forced)" } else { "" }
    );
    println!(
        "│ Bucket: {} of {} (floor {}, {} blocked)",
        stats.bucket_index, stats.ladder_len, stats.min_bucket_index, stats.unavailable_buckets
    );
    println!("│ Format: {}", format);
    println!("│ HDCP: {:?}", stats.hdcp);
    println!("├─────────────────────────────────────────────────────────────┤");
    println!("│ RATES                                                       │");
    println!("├─────────────────────────────────────────────────────────────┤");
    println!("│ Target:   {}", optional_rate(stats.target_bitrate_kbps));
    println!(
        "│ Observed: {} video / {} total",
        optional_rate(stats.observed.map(|o| o.video_bitrate_kbps)),
        optional_rate(stats.observed.map(|o| o.total_stream_kbps))
    );
    println!(
        "│ Hysteresis: {} up / {} down",
        stats.up_count, stats.down_count
    );
    println!(
        "│ Renegotiations: {} ok / {} failed, {} degrades",
        stats.renegotiations, stats.renegotiation_failures, stats.degrades
    );
    println!("└─────────────────────────────────────────────────────────────┘");
}

/// Display compact stats on one line (for continuous updates)
pub fn display_compact_stats(stats: &SessionStats, elapsed: Duration) {
    let format = stats
        .active_format
        .map_or_else(|| "none".to_string(), |f| f.to_string());

    print!(
        "\r[{:8}] {} | bucket {}/{} | {} | {} | up {} down {}         ",
        format_duration(elapsed),
        stats.profile,
        stats.bucket_index,
        stats.ladder_len,
        format,
        optional_rate(stats.target_bitrate_kbps),
        stats.up_count,
        stats.down_count
    );

    let _ = std::io::stdout().flush();
}
