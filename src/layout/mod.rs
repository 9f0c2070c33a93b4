mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::graph::{Edge, Node};
use crate::util::stable_pair;
use forces::{LinkSpring, accumulate_charge, apply_axis_pull, apply_springs, recenter};
use quadtree::QuadCell;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub charge_strength: f32,
    pub link_distance: f32,
    pub center_strength: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub theta: f32,
    pub drag_alpha_target: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            charge_strength: -300.0,
            link_distance: 150.0,
            center_strength: 0.1,
            velocity_decay: 0.4,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            theta: 0.9,
            drag_alpha_target: 0.3,
        }
    }
}

struct LayoutNode {
    id: String,
    velocity: Vec2,
    pin: Option<Vec2>,
}

/// Force simulation over a private arena. The arena is rebuilt from copies of
/// the store's nodes and edges on every restart; positions live only here.
pub struct LayoutEngine {
    config: LayoutConfig,
    center: Vec2,
    nodes: Vec<LayoutNode>,
    positions: Vec<Vec2>,
    index_by_id: HashMap<String, usize>,
    springs: Vec<LinkSpring>,
    velocity_scratch: Vec<Vec2>,
    alpha: f32,
    alpha_target: f32,
    running: bool,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            center: Vec2::ZERO,
            nodes: Vec::new(),
            positions: Vec::new(),
            index_by_id: HashMap::new(),
            springs: Vec::new(),
            velocity_scratch: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            running: false,
        }
    }

    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    /// Takes effect on the next step; callers restart to re-energize.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
    }

    /// Stops the current run and starts a fresh one over `nodes`/`edges`.
    /// Nodes already placed by the previous run keep their position and pin.
    pub fn restart(&mut self, nodes: &[Node], edges: &[Edge]) {
        let mut prior = self
            .nodes
            .drain(..)
            .zip(self.positions.drain(..))
            .map(|(node, position)| (node.id.clone(), (node, position)))
            .collect::<HashMap<_, _>>();
        self.index_by_id.clear();
        self.springs.clear();

        let mut fresh = Vec::new();
        for node in nodes {
            if self.index_by_id.contains_key(&node.id) {
                continue;
            }
            let index = self.nodes.len();
            self.index_by_id.insert(node.id.clone(), index);

            match prior.remove(&node.id) {
                Some((mut kept, position)) => {
                    kept.velocity = Vec2::ZERO;
                    self.nodes.push(kept);
                    self.positions.push(position);
                }
                None => {
                    self.nodes.push(LayoutNode {
                        id: node.id.clone(),
                        velocity: Vec2::ZERO,
                        pin: None,
                    });
                    self.positions.push(Vec2::ZERO);
                    fresh.push(index);
                }
            }
        }

        let mut degree = vec![0usize; self.nodes.len()];
        let mut pairs = Vec::with_capacity(edges.len());
        for edge in edges {
            let (Some(&source), Some(&target)) = (
                self.index_by_id.get(&edge.source),
                self.index_by_id.get(&edge.target),
            ) else {
                continue;
            };
            degree[source] += 1;
            degree[target] += 1;
            pairs.push((source, target));
        }

        self.springs = pairs
            .iter()
            .map(|&(source, target)| {
                let source_degree = degree[source] as f32;
                let target_degree = degree[target] as f32;
                LinkSpring {
                    source,
                    target,
                    strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();

        self.seed_fresh_nodes(&fresh, &pairs);

        self.alpha = 1.0;
        self.running = !self.nodes.is_empty();
        debug!(
            nodes = self.nodes.len(),
            links = self.springs.len(),
            placed = self.nodes.len() - fresh.len(),
            "layout restarted"
        );
    }

    fn seed_fresh_nodes(&mut self, fresh: &[usize], pairs: &[(usize, usize)]) {
        let mut placed = vec![true; self.nodes.len()];
        for &index in fresh {
            placed[index] = false;
        }
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());

        for &index in fresh {
            let anchor = pairs.iter().find_map(|&(source, target)| {
                let other = if source == index {
                    target
                } else if target == index {
                    source
                } else {
                    return None;
                };
                placed[other].then_some(other)
            });

            let (jx, jy) = stable_pair(&self.nodes[index].id);
            self.positions[index] = match anchor {
                Some(anchor) => {
                    let mut direction = vec2(jx, jy);
                    if direction.length_sq() <= 1e-6 {
                        direction = vec2(1.0, 0.0);
                    }
                    self.positions[anchor] + direction.normalized() * (self.config.link_distance * 0.5)
                }
                None => {
                    let radius = 10.0 * (0.5 + index as f32).sqrt();
                    let angle = index as f32 * golden_angle;
                    self.center + vec2(angle.cos(), angle.sin()) * radius
                }
            };
            placed[index] = true;
        }
    }

    /// Advances one step. Returns whether anything moved.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.nodes.is_empty() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        self.velocity_scratch.clear();
        self.velocity_scratch
            .extend(self.nodes.iter().map(|node| node.velocity));
        let velocities = &mut self.velocity_scratch;

        if let Some(tree) = QuadCell::build(&self.positions) {
            for (index, velocity) in velocities.iter_mut().enumerate() {
                accumulate_charge(
                    &tree,
                    index,
                    &self.positions,
                    self.config.charge_strength,
                    alpha,
                    self.config.theta,
                    velocity,
                );
            }
        }

        apply_springs(
            &self.springs,
            &self.positions,
            velocities,
            self.config.link_distance,
            alpha,
        );
        apply_axis_pull(
            &self.positions,
            velocities,
            self.center,
            self.config.center_strength,
            alpha,
        );
        recenter(&mut self.positions, self.center);

        let keep = 1.0 - self.config.velocity_decay;
        for ((node, position), velocity) in self
            .nodes
            .iter_mut()
            .zip(self.positions.iter_mut())
            .zip(velocities.iter())
        {
            match node.pin {
                Some(pin) => {
                    *position = pin;
                    node.velocity = Vec2::ZERO;
                }
                None => {
                    node.velocity = *velocity * keep;
                    *position += node.velocity;
                }
            }
        }

        if self.alpha < self.config.alpha_min {
            self.running = false;
        }
        true
    }

    pub fn pin(&mut self, id: &str, position: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.nodes[index].pin = Some(position);
        self.positions[index] = position;
        true
    }

    pub fn unpin(&mut self, id: &str) {
        if let Some(&index) = self.index_by_id.get(id) {
            self.nodes[index].pin = None;
        }
    }

    /// Raises the energy target so neighbours keep redistributing while a
    /// node is held.
    pub fn reheat(&mut self) {
        self.alpha_target = self.config.drag_alpha_target;
        self.running = !self.nodes.is_empty();
    }

    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    #[cfg(test)]
    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.index_of(id).map(|index| self.positions[index])
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn node_id(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|node| node.id.as_str())
    }

    #[cfg(test)]
    pub fn is_pinned(&self, id: &str) -> bool {
        self.index_of(id)
            .is_some_and(|index| self.nodes[index].pin.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphStore, Node};

    fn edge(source: &str, target: &str, transaction_id: &str) -> Edge {
        Edge {
            source: source.to_owned(),
            target: target.to_owned(),
            amount: 1.0,
            date: String::new(),
            transaction_id: transaction_id.to_owned(),
        }
    }

    fn settle(engine: &mut LayoutEngine, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while engine.tick() {
            ticks += 1;
            if ticks >= max_ticks {
                break;
            }
        }
        ticks
    }

    fn distance(engine: &LayoutEngine, a: &str, b: &str) -> f32 {
        let a = engine.position(a).expect("a placed");
        let b = engine.position(b).expect("b placed");
        (a - b).length()
    }

    #[test]
    fn linked_pair_settles_near_rest_length() {
        let mut engine = LayoutEngine::new(LayoutConfig::default());
        engine.restart(&[Node::unknown("a"), Node::unknown("b")], &[edge("a", "b", "t")]);

        settle(&mut engine, 1_000);

        let gap = distance(&engine, "a", "b");
        assert!((110.0..190.0).contains(&gap), "settled at {gap}");
    }

    #[test]
    fn unlinked_nodes_repel() {
        let mut engine = LayoutEngine::new(LayoutConfig::default());
        engine.restart(&[Node::unknown("a"), Node::unknown("b")], &[]);
        let before = distance(&engine, "a", "b");

        for _ in 0..50 {
            engine.tick();
        }

        assert!(distance(&engine, "a", "b") > before);
    }

    #[test]
    fn simulation_cools_and_stops() {
        let mut engine = LayoutEngine::new(LayoutConfig::default());
        engine.restart(&[Node::unknown("a"), Node::unknown("b")], &[edge("a", "b", "t")]);

        let ticks = settle(&mut engine, 2_000);

        assert!(!engine.is_running());
        assert!((250..=320).contains(&ticks), "stopped after {ticks} ticks");
        assert!(!engine.tick());
    }

    #[test]
    fn reheated_simulation_keeps_running_until_cooled() {
        let mut engine = LayoutEngine::new(LayoutConfig::default());
        engine.restart(&[Node::unknown("a"), Node::unknown("b")], &[edge("a", "b", "t")]);
        engine.reheat();

        assert_eq!(settle(&mut engine, 1_500), 1_500);
        assert!(engine.is_running());
        assert!(engine.alpha() > 0.25);

        engine.cool();
        settle(&mut engine, 2_000);
        assert!(!engine.is_running());
    }

    #[test]
    fn pinned_node_holds_its_position() {
        let mut engine = LayoutEngine::new(LayoutConfig::default());
        engine.restart(
            &[Node::unknown("a"), Node::unknown("b"), Node::unknown("c")],
            &[edge("a", "b", "t1"), edge("b", "c", "t2")],
        );
        let held = vec2(240.0, -80.0);

        assert!(engine.pin("b", held));
        for _ in 0..120 {
            engine.tick();
        }
        assert_eq!(engine.position("b"), Some(held));

        engine.unpin("b");
        assert!(!engine.is_pinned("b"));
        for _ in 0..5 {
            engine.tick();
        }
        assert_ne!(engine.position("b"), Some(held));
    }

    #[test]
    fn restart_keeps_prior_positions() {
        let mut engine = LayoutEngine::new(LayoutConfig::default());
        engine.restart(&[Node::unknown("a"), Node::unknown("b")], &[edge("a", "b", "t")]);
        settle(&mut engine, 60);
        let a_before = engine.position("a").expect("a");
        let b_before = engine.position("b").expect("b");

        engine.restart(
            &[Node::unknown("a"), Node::unknown("b"), Node::unknown("c")],
            &[edge("a", "b", "t"), edge("b", "c", "t2")],
        );

        assert_eq!(engine.position("a"), Some(a_before));
        assert_eq!(engine.position("b"), Some(b_before));
        assert!(engine.is_running());
        assert_eq!(engine.alpha(), 1.0);
        let c = engine.position("c").expect("c seeded");
        assert!(((c - b_before).length() - 75.0).abs() < 1e-2);
    }

    #[test]
    fn layout_leaves_the_store_untouched() {
        let mut store = GraphStore::new();
        store.add_node(Node::unknown("a"));
        store.add_node(Node::new("b", "Whitebit"));
        store.add_link(edge("a", "b", "t"));
        let nodes_before = store.state().nodes().to_vec();
        let links_before = store.state().links().to_vec();

        let mut engine = LayoutEngine::new(LayoutConfig::default());
        engine.restart(store.state().nodes(), store.state().links());
        settle(&mut engine, 400);

        assert_eq!(store.state().nodes(), nodes_before.as_slice());
        assert_eq!(store.state().links(), links_before.as_slice());
    }

    #[test]
    fn empty_graph_never_runs() {
        let mut engine = LayoutEngine::new(LayoutConfig::default());
        engine.restart(&[], &[]);

        assert!(!engine.is_running());
        assert!(!engine.tick());
        assert!(engine.is_empty());
    }
}
