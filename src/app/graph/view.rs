use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::{format_btc, shorten_address};

use super::super::highlight::build_highlight_state;
use super::super::render_utils::{
    NODE_RADIUS, SELECTED_COLOR, arc_control_point, arc_end_direction, blend_color,
    circle_visible, cubic_point, draw_arrowhead, draw_background, edge_stroke_width, entity_color,
    fade_color, loop_end_direction, quadratic_point, self_loop_points,
};
use super::super::{SearchMatchCache, ViewModel};

const ARC_BEND: f32 = 0.18;
const PARALLEL_ARC_STEP: f32 = 0.12;
const SELF_LOOP_LIFT: f32 = 2.6;
const SELF_LOOP_STEP: f32 = 0.6;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let topology_revision = self.store.revisions().topology;
        if let Some(cached) = &self.search_match_cache
            && cached.topology_revision == topology_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .store
            .state()
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let hit = fuzzy_match_score(&matcher, &node.id, query).is_some()
                    || fuzzy_match_score(&matcher, &node.entity_name, query).is_some();
                hit.then_some(index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            topology_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        self.sync_layout();

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.export.set_canvas_rect(rect);
        let painter = ui.painter_at(rect);
        let palette = self.theme.palette();

        draw_background(&painter, rect, self.transform.pan, self.transform.zoom, &palette);

        if self.layout.is_empty() {
            let message = if self.lookups.is_empty() {
                "Add a wallet address to start tracing"
            } else {
                "Looking up wallet flows..."
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(16.0),
                palette.muted_label,
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);

        let hovered = {
            let screen_positions = self.screen_positions(rect);
            Self::hovered_index(ui, &screen_positions, NODE_RADIUS * self.transform.zoom)
        };
        self.handle_graph_gestures(rect, &response, hovered);

        if self.layout.tick() || self.gesture.is_active() {
            ui.ctx().request_repaint();
        }

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let clicked = response.clicked_by(egui::PointerButton::Primary);
        let search_matches = self.cached_search_matches();
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let zoom = self.transform.zoom;
        let radius = NODE_RADIUS * zoom;
        let screen_positions = self.screen_positions(rect);
        let state = self.store.state();
        let highlight = build_highlight_state(state);
        let selection_active = highlight.as_ref().is_some_and(|highlight| highlight.is_active());

        let index_by_id = state
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index))
            .collect::<HashMap<_, _>>();
        let label_font = (11.0 * zoom).clamp(4.0, 36.0);
        let show_node_captions = label_font >= 6.0;

        let mut parallel_rank: HashMap<(usize, usize), usize> = HashMap::new();
        for (edge_index, edge) in state.links().iter().enumerate() {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(edge.source.as_str()),
                index_by_id.get(edge.target.as_str()),
            ) else {
                continue;
            };
            let (Some(&start), Some(&end)) = (screen_positions.get(source), screen_positions.get(target))
            else {
                continue;
            };

            let rank = parallel_rank.entry((source, target)).or_insert(0);
            let parallel = *rank as f32;
            *rank += 1;

            let emphasized = highlight
                .as_ref()
                .is_some_and(|highlight| highlight.related_edges.contains(&edge_index));
            let color = if emphasized {
                palette.edge_emphasis
            } else if selection_active {
                fade_color(palette.edge, 0.25)
            } else {
                palette.edge
            };
            let width = edge_stroke_width(edge.amount) * zoom;
            let stroke = Stroke::new(width, color);

            let (tip, direction, midpoint) = if source == target {
                let points = self_loop_points(start, radius, SELF_LOOP_LIFT + parallel * SELF_LOOP_STEP);
                painter.add(egui::epaint::CubicBezierShape::from_points_stroke(
                    points,
                    false,
                    Color32::TRANSPARENT,
                    stroke,
                ));
                (points[3], loop_end_direction(points), cubic_point(points, 0.5))
            } else {
                let control = arc_control_point(start, end, ARC_BEND + parallel * PARALLEL_ARC_STEP);
                let points = [start, control, end];
                painter.add(egui::epaint::QuadraticBezierShape::from_points_stroke(
                    points,
                    false,
                    Color32::TRANSPARENT,
                    stroke,
                ));
                let direction = arc_end_direction(points);
                (
                    end - direction * (radius + 2.0 * zoom),
                    direction,
                    quadratic_point(points, 0.5),
                )
            };
            draw_arrowhead(&painter, tip, direction, (8.0 + width) * zoom.sqrt(), color);

            let label_color = if selection_active && !emphasized {
                fade_color(palette.edge_label, 0.4)
            } else {
                palette.edge_label
            };
            painter.text(
                midpoint - vec2(0.0, 5.0 * zoom),
                Align2::CENTER_BOTTOM,
                format_btc(edge.amount, 6),
                FontId::proportional(label_font * 0.9),
                label_color,
            );
        }

        let mut selection_animating = false;
        for (index, node) in state.nodes().iter().enumerate() {
            let Some(&position) = screen_positions.get(index) else {
                continue;
            };
            if !circle_visible(rect, position, radius + 60.0 * zoom) {
                continue;
            }

            let is_selected = highlight
                .as_ref()
                .is_some_and(|highlight| highlight.selected_index == Some(index));
            let is_related = highlight
                .as_ref()
                .is_some_and(|highlight| highlight.related_nodes.contains(&index));
            let is_hovered = hovered == Some(index);
            let is_search_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base_color = entity_color(&node.entity_name);
            let unselected_color = if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.25)
            } else if is_search_match {
                blend_color(base_color, palette.search_match, 0.6)
            } else if (selection_active && !is_related) || (search_active && !is_search_match) {
                fade_color(base_color, 0.45)
            } else {
                base_color
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.id.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }

            if selection_mix > 0.0 {
                for (spread, alpha) in [(14.0, 28.0), (9.0, 46.0), (5.0, 70.0)] {
                    painter.circle_filled(
                        position,
                        radius + spread * zoom,
                        Color32::from_rgba_unmultiplied(
                            SELECTED_COLOR.r(),
                            SELECTED_COLOR.g(),
                            SELECTED_COLOR.b(),
                            (alpha * selection_mix) as u8,
                        ),
                    );
                }
            }

            let fill = blend_color(
                unselected_color,
                blend_color(base_color, Color32::WHITE, 0.3),
                selection_mix,
            );
            painter.circle_filled(position, radius, fill);

            let ring = if selection_mix > 0.0 {
                Stroke::new((1.5 + selection_mix * 2.0) * zoom, SELECTED_COLOR)
            } else if is_search_match {
                Stroke::new(2.0 * zoom, palette.search_match)
            } else {
                Stroke::new(1.5 * zoom, palette.node_stroke)
            };
            painter.circle_stroke(position, radius, ring);

            if show_node_captions {
                painter.text(
                    position + vec2(0.0, radius + 4.0 * zoom),
                    Align2::CENTER_TOP,
                    node.entity_name.as_str(),
                    FontId::proportional(label_font),
                    palette.label,
                );
                painter.text(
                    position + vec2(0.0, radius + 4.0 * zoom + label_font * 1.25),
                    Align2::CENTER_TOP,
                    shorten_address(&node.id),
                    FontId::monospace(label_font * 0.85),
                    palette.muted_label,
                );
            }
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }

        if let Some(node) = hovered.and_then(|index| state.nodes().get(index)) {
            let panel_text = format!(
                "{}  |  {}  |  {} connections",
                node.entity_name,
                node.id,
                state.links().iter().filter(|edge| edge.touches(&node.id)).count()
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                palette.label,
            );
        }

        if clicked && !self.gesture.is_active() {
            self.apply_graph_click(hovered);
        }
    }

    fn screen_positions(&self, rect: egui::Rect) -> Vec<Pos2> {
        self.layout
            .positions()
            .iter()
            .map(|world| self.transform.world_to_screen(rect, *world))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use eframe::egui::{CentralPanel, Context, Frame, RawInput, Shape};

    use super::*;
    use crate::app::render_utils::Theme;
    use crate::flow::{FixtureSource, FlowSource, WalletFlows};
    use crate::graph::{Edge, Node, apply_wallet_flows};

    const CHANGENOW: &str = "bc1qng0keqn7cq6p8qdt4rjnzdxrygnzq7nd0pju8q";

    fn model() -> ViewModel {
        ViewModel::new(
            Arc::new(FixtureSource),
            Duration::from_secs(10),
            PathBuf::from("."),
            Theme::Dark,
        )
    }

    fn load_fixtures(model: &mut ViewModel, address: &str) {
        let flows = WalletFlows {
            address: address.to_owned(),
            inflows: FixtureSource.inflows(address).expect("fixtures").data,
            outflows: FixtureSource.outflows(address).expect("fixtures").data,
        };
        apply_wallet_flows(&mut model.store, flows);
    }

    fn flatten(shape: Shape, out: &mut Vec<Shape>) {
        match shape {
            Shape::Vec(shapes) => shapes.into_iter().for_each(|shape| flatten(shape, out)),
            other => out.push(other),
        }
    }

    fn render_frame(model: &mut ViewModel) -> Vec<Shape> {
        let ctx = Context::default();
        let output = ctx.run(RawInput::default(), |ctx| {
            CentralPanel::default()
                .frame(Frame::NONE)
                .show(ctx, |ui| model.draw_graph(ui));
        });

        let mut shapes = Vec::new();
        for clipped in output.shapes {
            flatten(clipped.shape, &mut shapes);
        }
        shapes
    }

    fn amount_labels(shapes: &[Shape]) -> usize {
        shapes
            .iter()
            .filter(|shape| matches!(shape, Shape::Text(text) if text.galley.text().contains(" BTC")))
            .count()
    }

    #[test]
    fn every_edge_is_labelled_with_or_without_a_selection() {
        let mut model = model();
        load_fixtures(&mut model, "bc1qsource");
        let edges = model.store.state().edge_count();
        assert_eq!(edges, 4);

        assert_eq!(amount_labels(&render_frame(&mut model)), edges);

        model.set_selected(Some(CHANGENOW.to_owned()));
        assert_eq!(amount_labels(&render_frame(&mut model)), edges);
    }

    #[test]
    fn edge_labels_survive_zooming_out() {
        let mut model = model();
        load_fixtures(&mut model, "bc1qsource");
        model.transform.zoom = 0.1;

        assert_eq!(amount_labels(&render_frame(&mut model)), 4);
    }

    #[test]
    fn self_transfer_is_drawn_as_a_loop() {
        let mut model = model();
        model.store.add_node(Node::unknown("bc1qself"));
        model.store.add_link(Edge {
            source: "bc1qself".to_owned(),
            target: "bc1qself".to_owned(),
            amount: 0.25,
            date: "2022-07-17 14:10:09".to_owned(),
            transaction_id: "loop".to_owned(),
        });

        let shapes = render_frame(&mut model);

        assert_eq!(
            shapes
                .iter()
                .filter(|shape| matches!(shape, Shape::CubicBezier(_)))
                .count(),
            1
        );
        assert_eq!(amount_labels(&shapes), 1);
    }
}
