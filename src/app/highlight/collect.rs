use std::collections::{HashMap, HashSet};

use crate::graph::Edge;

/// One hop around `selected_id` in both directions. Edge indices follow the
/// store's link order; node indices come from `index_by_id`.
pub(super) fn collect_adjacent(
    edges: &[Edge],
    selected_id: &str,
    index_by_id: &HashMap<&str, usize>,
    related_nodes: &mut HashSet<usize>,
    related_edges: &mut HashSet<usize>,
) {
    for (edge_index, edge) in edges.iter().enumerate() {
        if !edge.touches(selected_id) {
            continue;
        }
        related_edges.insert(edge_index);

        for endpoint in [edge.source.as_str(), edge.target.as_str()] {
            if let Some(&index) = index_by_id.get(endpoint) {
                related_nodes.insert(index);
            }
        }
    }
}
