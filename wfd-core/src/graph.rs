//! Format compatibility graph and path finder
//!
//! The peer can only change resolution or frame rate in a single
//! renegotiation step, never both. Moving between two arbitrary formats
//! therefore may require intermediate hops through other formats the peer
//! supports. The graph is built once per capability list and reused for
//! every path query.
//!
//! # Tie-break contract
//!
//! Nodes are stored in the order of the capability list and breadth-first
//! search expands neighbours in that order. When several shortest paths
//! exist, the one discovered first wins, i.e. the path whose hops appear
//! earliest in the peer's list. Callers that need a different preference
//! should reorder the list before building the graph.

use crate::format::{SupportedFormat, VideoFormat};
use std::collections::VecDeque;

/// Adjacency graph over the formats a peer supports
#[derive(Debug, Clone, Default)]
pub struct FormatGraph {
    /// Node arena, in capability-list order
    nodes: Vec<VideoFormat>,
    /// Peer default bitrate per node (kbps)
    default_bitrates: Vec<u32>,
    /// Adjacency lists, neighbours in ascending node order
    edges: Vec<Vec<usize>>,
}

impl FormatGraph {
    /// Build the graph from the peer's capability list
    ///
    /// Unsupported entries and duplicates are skipped.
    pub fn build(formats: &[SupportedFormat]) -> Self {
        let mut nodes: Vec<VideoFormat> = Vec::with_capacity(formats.len());
        let mut default_bitrates = Vec::with_capacity(formats.len());

        for entry in formats.iter().filter(|f| f.supported) {
            if nodes.contains(&entry.format) {
                continue;
            }
            nodes.push(entry.format);
            default_bitrates.push(entry.default_bitrate_kbps);
        }

        let edges = nodes
            .iter()
            .map(|a| {
                nodes
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| a.is_adjacent(b))
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();

        tracing::debug!("Built format graph with {} nodes", nodes.len());

        FormatGraph {
            nodes,
            default_bitrates,
            edges,
        }
    }

    /// Number of formats in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no formats
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Formats in capability-list order
    pub fn formats(&self) -> &[VideoFormat] {
        &self.nodes
    }

    /// Whether the peer supports this format
    pub fn contains(&self, format: &VideoFormat) -> bool {
        self.index_of(format).is_some()
    }

    /// Peer default bitrate for a format, if supported
    pub fn default_bitrate(&self, format: &VideoFormat) -> Option<u32> {
        self.index_of(format).map(|i| self.default_bitrates[i])
    }

    fn index_of(&self, format: &VideoFormat) -> Option<usize> {
        self.nodes.iter().position(|n| n == format)
    }

    /// Breadth-first search returning the predecessor table from `start`
    fn search(&self, start: usize, goal: usize) -> Option<Vec<Option<usize>>> {
        let mut prev: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();

        visited[start] = true;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            if node == goal {
                return Some(prev);
            }
            for &next in &self.edges[node] {
                if !visited[next] {
                    visited[next] = true;
                    prev[next] = Some(node);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Shortest hop sequence from `from` to `to`, both ends included
    ///
    /// Returns an empty vector when either format is not supported or the
    /// destination is unreachable. A path from a format to itself is the
    /// single-element path.
    pub fn shortest_path(&self, from: &VideoFormat, to: &VideoFormat) -> Vec<VideoFormat> {
        let (Some(start), Some(goal)) = (self.index_of(from), self.index_of(to)) else {
            return Vec::new();
        };

        let Some(prev) = self.search(start, goal) else {
            tracing::debug!("No renegotiation path from {} to {}", from, to);
            return Vec::new();
        };

        let mut path = vec![self.nodes[goal]];
        let mut cursor = goal;
        while let Some(p) = prev[cursor] {
            path.push(self.nodes[p]);
            cursor = p;
        }
        path.reverse();
        path
    }

    /// Number of hops between two formats, if reachable
    pub fn distance(&self, from: &VideoFormat, to: &VideoFormat) -> Option<usize> {
        let path = self.shortest_path(from, to);
        if path.is_empty() {
            None
        } else {
            Some(path.len() - 1)
        }
    }
}
