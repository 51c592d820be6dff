//! Property-based tests for the format compatibility graph
//!
//! Random capability lists drawn from a grid of resolutions and frame rates,
//! checked against a brute-force distance computation.

use proptest::prelude::*;
use std::collections::VecDeque;
use wfd_core::{FormatGraph, SupportedFormat, VideoFormat};

const RESOLUTIONS: [(u32, u32); 5] = [
    (640, 480),
    (1280, 720),
    (1600, 900),
    (1920, 1080),
    (2560, 1440),
];
const FRAME_RATES: [u32; 4] = [24, 30, 50, 60];

fn grid() -> Vec<VideoFormat> {
    RESOLUTIONS
        .iter()
        .flat_map(|&(w, h)| FRAME_RATES.iter().map(move |&fps| VideoFormat::with_fps(w, h, fps)))
        .collect()
}

// Property test strategies

fn capability_strategy() -> impl Strategy<Value = Vec<SupportedFormat>> {
    let formats = grid();
    let len = formats.len();
    (
        prop::collection::vec(any::<bool>(), len),
        Just(formats).prop_shuffle(),
    )
        .prop_map(|(keep, formats)| {
            formats
                .into_iter()
                .zip(keep)
                .filter(|(_, keep)| *keep)
                .map(|(format, _)| SupportedFormat::new(format, format.height * 5))
                .collect()
        })
}

/// Hop counts from `start` using nothing but the adjacency rule
fn reference_distances(formats: &[VideoFormat], start: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; formats.len()];
    let mut queue = VecDeque::new();
    dist[start] = Some(0);
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        let next_dist = dist[node].map(|d| d + 1);
        for (i, other) in formats.iter().enumerate() {
            if dist[i].is_none() && formats[node].is_adjacent(other) {
                dist[i] = next_dist;
                queue.push_back(i);
            }
        }
    }
    dist
}

// Property tests

proptest! {
    #[test]
    fn prop_path_length_matches_bfs_distance(caps in capability_strategy()) {
        let graph = FormatGraph::build(&caps);
        let formats: Vec<VideoFormat> = caps.iter().map(|c| c.format).collect();

        for (i, from) in formats.iter().enumerate() {
            let distances = reference_distances(&formats, i);
            for (j, to) in formats.iter().enumerate() {
                let path = graph.shortest_path(from, to);
                match distances[j] {
                    Some(d) => {
                        prop_assert_eq!(path.len(), d + 1);
                        prop_assert_eq!(path.first(), Some(from));
                        prop_assert_eq!(path.last(), Some(to));
                    }
                    None => prop_assert!(path.is_empty()),
                }
            }
        }
    }

    #[test]
    fn prop_every_hop_changes_exactly_one_axis(caps in capability_strategy()) {
        let graph = FormatGraph::build(&caps);

        for from in graph.formats() {
            for to in graph.formats() {
                let path = graph.shortest_path(from, to);
                for pair in path.windows(2) {
                    prop_assert!(pair[0].is_adjacent(&pair[1]));
                    prop_assert!(pair[0].same_resolution(&pair[1]) != pair[0].same_frame_rate(&pair[1]));
                }
            }
        }
    }

    #[test]
    fn prop_paths_only_use_supported_formats(
        caps in capability_strategy(),
        dropped in prop::collection::vec(any::<bool>(), 20),
    ) {
        let caps: Vec<SupportedFormat> = caps
            .into_iter()
            .zip(dropped)
            .map(|(cap, drop)| if drop { SupportedFormat::unsupported(cap.format, cap.default_bitrate_kbps) } else { cap })
            .collect();
        let graph = FormatGraph::build(&caps);

        for from in graph.formats() {
            for to in graph.formats() {
                for hop in graph.shortest_path(from, to) {
                    prop_assert!(caps.iter().any(|c| c.supported && c.format == hop));
                }
            }
        }
    }

    #[test]
    fn prop_path_is_deterministic(caps in capability_strategy()) {
        let first = FormatGraph::build(&caps);
        let second = FormatGraph::build(&caps);

        for from in first.formats() {
            for to in first.formats() {
                prop_assert_eq!(first.shortest_path(from, to), second.shortest_path(from, to));
            }
        }
    }
}

#[test]
fn test_tie_break_follows_capability_order() {
    let from = VideoFormat::with_fps(1280, 720, 60);
    let to = VideoFormat::with_fps(1920, 1080, 30);
    let via_720p30 = VideoFormat::with_fps(1280, 720, 30);
    let via_1080p60 = VideoFormat::with_fps(1920, 1080, 60);

    let caps = |order: [VideoFormat; 4]| -> Vec<SupportedFormat> {
        order.iter().map(|f| SupportedFormat::new(*f, 5_000)).collect()
    };

    let graph = FormatGraph::build(&caps([from, via_720p30, via_1080p60, to]));
    assert_eq!(graph.shortest_path(&from, &to), vec![from, via_720p30, to]);

    let graph = FormatGraph::build(&caps([from, via_1080p60, via_720p30, to]));
    assert_eq!(graph.shortest_path(&from, &to), vec![from, via_1080p60, to]);
}
