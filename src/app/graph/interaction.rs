use eframe::egui::{self, Pos2, Rect, Ui, Vec2};

use super::super::ViewModel;

pub(in crate::app) const MIN_ZOOM: f32 = 0.1;
pub(in crate::app) const MAX_ZOOM: f32 = 10.0;

/// Scale-and-pan applied to the whole scene. World origin sits at the canvas
/// center when `pan` is zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ViewTransform {
    pub(in crate::app) pan: Vec2,
    pub(in crate::app) zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub(in crate::app) fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub(in crate::app) fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    /// Multiplies the zoom by `factor` while keeping the world point under
    /// `anchor` fixed on screen.
    pub(in crate::app) fn zoom_at(&mut self, rect: Rect, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world_before = self.screen_to_world(rect, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - rect.center() - (world_before * self.zoom);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(in crate::app) struct WheelInput {
    pub(in crate::app) scroll_y: f32,
    pub(in crate::app) command_held: bool,
    pub(in crate::app) pinch: f32,
}

/// Plain wheel scrolling never zooms. Pinch gestures (and the zoom egui
/// derives from ctrl/cmd + wheel) win over the raw scroll delta.
pub(in crate::app) fn zoom_factor(input: WheelInput) -> Option<f32> {
    if (input.pinch - 1.0).abs() > f32::EPSILON {
        return Some(input.pinch);
    }
    if input.command_held && input.scroll_y.abs() > f32::EPSILON {
        return Some((1.0 + (input.scroll_y * 0.0018)).clamp(0.85, 1.15));
    }
    None
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) enum Gesture {
    #[default]
    Idle,
    Dragging {
        node: String,
        grab_offset: Vec2,
    },
    Panning {
        anchor: Pos2,
        origin_pan: Vec2,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum PointerEvent {
    /// Primary press. `node` carries the hit node and its world position.
    Press {
        screen: Pos2,
        world: Vec2,
        node: Option<(String, Vec2)>,
    },
    /// Secondary or middle press; always pans.
    PanPress { screen: Pos2 },
    Move { screen: Pos2, world: Vec2 },
    Release,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum GestureCommand {
    Reheat,
    Cool,
    Pin { node: String, world: Vec2 },
    Unpin { node: String },
    SetPan(Vec2),
}

impl Gesture {
    /// Pure transition. `pan` is the transform's current pan, captured when a
    /// pan gesture starts.
    pub(in crate::app) fn advance(self, event: PointerEvent, pan: Vec2) -> (Self, Vec<GestureCommand>) {
        match (self, event) {
            (Self::Idle, PointerEvent::Press { world, node: Some((node, position)), .. }) => {
                let commands = vec![
                    GestureCommand::Reheat,
                    GestureCommand::Pin {
                        node: node.clone(),
                        world: position,
                    },
                ];
                (
                    Self::Dragging {
                        node,
                        grab_offset: position - world,
                    },
                    commands,
                )
            }
            (Self::Idle, PointerEvent::Press { screen, node: None, .. })
            | (Self::Idle, PointerEvent::PanPress { screen }) => (
                Self::Panning {
                    anchor: screen,
                    origin_pan: pan,
                },
                Vec::new(),
            ),
            (Self::Dragging { node, grab_offset }, PointerEvent::Move { world, .. }) => {
                let command = GestureCommand::Pin {
                    node: node.clone(),
                    world: world + grab_offset,
                };
                (Self::Dragging { node, grab_offset }, vec![command])
            }
            (Self::Panning { anchor, origin_pan }, PointerEvent::Move { screen, .. }) => (
                Self::Panning { anchor, origin_pan },
                vec![GestureCommand::SetPan(origin_pan + (screen - anchor))],
            ),
            (Self::Dragging { node, .. }, PointerEvent::Release) => {
                (Self::Idle, vec![GestureCommand::Cool, GestureCommand::Unpin { node }])
            }
            (Self::Panning { .. }, PointerEvent::Release) => (Self::Idle, Vec::new()),
            // A second press while a gesture is active is ignored.
            (gesture, _) => (gesture, Vec::new()),
        }
    }

    pub(in crate::app) fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub(in crate::app) fn dragged_node(&self) -> Option<&str> {
        match self {
            Self::Dragging { node, .. } => Some(node),
            _ => None,
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let input = ui.input(|input| WheelInput {
            scroll_y: input.raw_scroll_delta.y,
            command_held: input.modifiers.command || input.modifiers.ctrl,
            pinch: input.zoom_delta(),
        });
        let Some(factor) = zoom_factor(input) else {
            return;
        };

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        self.transform.zoom_at(rect, pointer, factor);
    }

    /// Feeds this frame's pointer activity through the gesture machine.
    pub(in crate::app) fn handle_graph_gestures(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        let Some(pointer) = response.interact_pointer_pos().or_else(|| response.hover_pos()) else {
            if response.drag_stopped() {
                self.advance_gesture(PointerEvent::Release);
            }
            return;
        };
        let world = self.transform.screen_to_world(rect, pointer);

        if response.drag_started_by(egui::PointerButton::Primary) {
            let node = hovered.and_then(|index| {
                let id = self.layout.node_id(index)?.to_owned();
                let position = self.layout.positions().get(index).copied()?;
                Some((id, position))
            });
            self.advance_gesture(PointerEvent::Press {
                screen: pointer,
                world,
                node,
            });
        } else if response.drag_started_by(egui::PointerButton::Secondary)
            || response.drag_started_by(egui::PointerButton::Middle)
        {
            self.advance_gesture(PointerEvent::PanPress { screen: pointer });
        }

        if response.dragged() && self.gesture.is_active() {
            self.advance_gesture(PointerEvent::Move {
                screen: pointer,
                world,
            });
        }

        if response.drag_stopped() {
            self.advance_gesture(PointerEvent::Release);
        }
    }

    fn advance_gesture(&mut self, event: PointerEvent) {
        let gesture = std::mem::take(&mut self.gesture);
        let (next, commands) = gesture.advance(event, self.transform.pan);
        self.gesture = next;

        for command in commands {
            match command {
                GestureCommand::Reheat => self.layout.reheat(),
                GestureCommand::Cool => self.layout.cool(),
                GestureCommand::Pin { node, world } => {
                    self.layout.pin(&node, world);
                }
                GestureCommand::Unpin { node } => self.layout.unpin(&node),
                GestureCommand::SetPan(pan) => self.transform.pan = pan,
            }
        }
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        screen_positions: &[Pos2],
        screen_radius: f32,
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        screen_positions
            .iter()
            .enumerate()
            .filter_map(|(index, position)| {
                let distance = position.distance(pointer);
                (distance <= screen_radius).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Click on a node selects it; click on empty canvas clears the selection.
    pub(in crate::app) fn apply_graph_click(&mut self, hovered: Option<usize>) {
        let selected = hovered.and_then(|index| self.layout.node_id(index).map(str::to_owned));
        self.set_selected(selected);
    }

    pub(in crate::app) fn reset_view(&mut self) {
        self.transform = ViewTransform::default();
    }
}
