use std::collections::HashSet;
use std::ops::BitOrAssign;

use tracing::warn;

use crate::flow::ConnectionRecord;

pub const UNKNOWN_ENTITY: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub entity_name: String,
}

impl Node {
    pub fn new(id: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_name: entity_name.into(),
        }
    }

    pub fn unknown(id: impl Into<String>) -> Self {
        Self::new(id, UNKNOWN_ENTITY)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub date: String,
    pub transaction_id: String,
}

type EdgeKey = (String, String, String);

impl Edge {
    fn key(&self) -> EdgeKey {
        (
            self.source.clone(),
            self.target.clone(),
            self.transaction_id.clone(),
        )
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GraphAction {
    AddNode(Node),
    AddLink(Edge),
    SetSelectedNode(Option<String>),
    SetInflows(Vec<ConnectionRecord>),
    SetOutflows(Vec<ConnectionRecord>),
    Clear,
}

/// Which observable slices an action touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliceChanges {
    pub topology: bool,
    pub selection: bool,
    pub records: bool,
}

impl SliceChanges {
    fn between(before: Revisions, after: Revisions) -> Self {
        Self {
            topology: before.topology != after.topology,
            selection: before.selection != after.selection,
            records: before.records != after.records,
        }
    }
}

impl BitOrAssign for SliceChanges {
    fn bitor_assign(&mut self, other: Self) {
        self.topology |= other.topology;
        self.selection |= other.selection;
        self.records |= other.records;
    }
}

/// Per-slice change counters. Observers compare against the value they last
/// derived from instead of diffing state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Revisions {
    pub topology: u64,
    pub selection: u64,
    pub records: u64,
}

#[derive(Clone, Debug, Default)]
pub struct GraphState {
    nodes: Vec<Node>,
    links: Vec<Edge>,
    selected_node: Option<String>,
    inflows: Vec<ConnectionRecord>,
    outflows: Vec<ConnectionRecord>,
    node_ids: HashSet<String>,
    edge_keys: HashSet<EdgeKey>,
    revisions: Revisions,
}

impl GraphState {
    /// Pure reducer: consumes the state and returns the next one. Every slice
    /// the action actually changed gets its revision bumped.
    pub fn reduce(mut self, action: GraphAction) -> Self {
        match action {
            GraphAction::AddNode(node) => {
                if self.node_ids.insert(node.id.clone()) {
                    self.nodes.push(node);
                    bump(&mut self.revisions.topology);
                }
            }
            GraphAction::AddLink(edge) => {
                if !self.node_ids.contains(&edge.source) || !self.node_ids.contains(&edge.target) {
                    warn!(
                        source = %edge.source,
                        target = %edge.target,
                        "dropping edge whose endpoints are not in the graph"
                    );
                } else if self.edge_keys.insert(edge.key()) {
                    self.links.push(edge);
                    bump(&mut self.revisions.topology);
                }
            }
            GraphAction::SetSelectedNode(selected) => {
                if self.selected_node != selected {
                    self.selected_node = selected;
                    bump(&mut self.revisions.selection);
                }
            }
            GraphAction::SetInflows(records) => {
                self.inflows = records;
                bump(&mut self.revisions.records);
            }
            GraphAction::SetOutflows(records) => {
                self.outflows = records;
                bump(&mut self.revisions.records);
            }
            GraphAction::Clear => {
                let mut revisions = self.revisions;
                if !self.nodes.is_empty() || !self.links.is_empty() {
                    bump(&mut revisions.topology);
                }
                if self.selected_node.is_some() {
                    bump(&mut revisions.selection);
                }
                if !self.inflows.is_empty() || !self.outflows.is_empty() {
                    bump(&mut revisions.records);
                }
                return Self {
                    revisions,
                    ..Self::default()
                };
            }
        }
        self
    }

    pub fn revisions(&self) -> Revisions {
        self.revisions
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Edge] {
        &self.links
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    pub fn inflows(&self) -> &[ConnectionRecord] {
        &self.inflows
    }

    pub fn outflows(&self) -> &[ConnectionRecord] {
        &self.outflows
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        if !self.node_ids.contains(id) {
            return None;
        }
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.links.len()
    }
}

fn bump(revision: &mut u64) {
    *revision = revision.wrapping_add(1);
}

/// Owns the current `GraphState` and routes every mutation through
/// `GraphState::reduce`.
#[derive(Debug, Default)]
pub struct GraphStore {
    state: GraphState,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, action: GraphAction) -> SliceChanges {
        let before = self.state.revisions();
        self.state = std::mem::take(&mut self.state).reduce(action);
        SliceChanges::between(before, self.state.revisions())
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn revisions(&self) -> Revisions {
        self.state.revisions()
    }

    pub fn add_node(&mut self, node: Node) -> SliceChanges {
        self.dispatch(GraphAction::AddNode(node))
    }

    pub fn add_link(&mut self, edge: Edge) -> SliceChanges {
        self.dispatch(GraphAction::AddLink(edge))
    }

    pub fn set_selected_node(&mut self, selected: Option<String>) -> SliceChanges {
        self.dispatch(GraphAction::SetSelectedNode(selected))
    }

    pub fn set_inflows(&mut self, records: Vec<ConnectionRecord>) -> SliceChanges {
        self.dispatch(GraphAction::SetInflows(records))
    }

    pub fn set_outflows(&mut self, records: Vec<ConnectionRecord>) -> SliceChanges {
        self.dispatch(GraphAction::SetOutflows(records))
    }

    pub fn clear(&mut self) -> SliceChanges {
        self.dispatch(GraphAction::Clear)
    }
}
