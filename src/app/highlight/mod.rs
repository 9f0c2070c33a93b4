use std::collections::{HashMap, HashSet};

use crate::graph::GraphState;

mod collect;

use self::collect::collect_adjacent;
use super::HighlightState;

/// `None` without a selection. A selection that names no node yields an empty
/// state, so nothing is emphasized.
pub(super) fn build_highlight_state(state: &GraphState) -> Option<HighlightState> {
    let selected_id = state.selected_node()?;

    let index_by_id = state
        .nodes()
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect::<HashMap<_, _>>();
    let selected_index = index_by_id.get(selected_id).copied();

    let mut related_nodes = HashSet::new();
    let mut related_edges = HashSet::new();
    if selected_index.is_some() {
        collect_adjacent(
            state.links(),
            selected_id,
            &index_by_id,
            &mut related_nodes,
            &mut related_edges,
        );
    }

    Some(HighlightState {
        selected_index,
        related_nodes,
        related_edges,
    })
}

impl HighlightState {
    pub(super) fn is_active(&self) -> bool {
        self.selected_index.is_some()
    }
}
