use eframe::egui::{self, Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};

pub(super) const NODE_RADIUS: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

pub(super) struct Palette {
    pub(super) background: Color32,
    pub(super) grid: Color32,
    pub(super) node_stroke: Color32,
    pub(super) label: Color32,
    pub(super) muted_label: Color32,
    pub(super) edge: Color32,
    pub(super) edge_emphasis: Color32,
    pub(super) edge_label: Color32,
    pub(super) search_match: Color32,
}

impl Theme {
    pub(super) fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub(super) fn toggle_label(self) -> &'static str {
        match self {
            Self::Dark => "☀ Light mode",
            Self::Light => "🌙 Dark mode",
        }
    }

    pub(super) fn apply(self, ctx: &egui::Context) {
        let visuals = match self {
            Self::Dark => egui::Visuals::dark(),
            Self::Light => egui::Visuals::light(),
        };
        ctx.set_visuals(visuals);
    }

    pub(super) fn palette(self) -> Palette {
        match self {
            Self::Dark => Palette {
                background: Color32::from_rgb(19, 23, 29),
                grid: Color32::from_rgba_unmultiplied(60, 70, 80, 70),
                node_stroke: Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                label: Color32::from_gray(238),
                muted_label: Color32::from_gray(160),
                edge: Color32::from_rgba_unmultiplied(150, 150, 150, 170),
                edge_emphasis: Color32::from_rgb(241, 146, 94),
                edge_label: Color32::from_gray(200),
                search_match: Color32::from_rgb(103, 196, 255),
            },
            Self::Light => Palette {
                background: Color32::from_rgb(246, 247, 249),
                grid: Color32::from_rgba_unmultiplied(170, 178, 188, 70),
                node_stroke: Color32::from_rgba_unmultiplied(255, 255, 255, 220),
                label: Color32::from_gray(30),
                muted_label: Color32::from_gray(100),
                edge: Color32::from_rgba_unmultiplied(153, 153, 153, 170),
                edge_emphasis: Color32::from_rgb(214, 104, 52),
                edge_label: Color32::from_gray(60),
                search_match: Color32::from_rgb(30, 136, 229),
            },
        }
    }
}

pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

pub(super) fn entity_color(entity_name: &str) -> Color32 {
    match entity_name {
        "Unknown" => Color32::from_rgb(0xaa, 0xaa, 0xaa),
        "Whitebit" => Color32::from_rgb(0x89, 0xcf, 0xf0),
        "Changenow" => Color32::from_rgb(0x90, 0xee, 0x90),
        _ => Color32::from_rgb(0xff, 0xa0, 0x7a),
    }
}

/// Monotonic in `amount`; negative amounts draw as the thinnest arc.
pub(super) fn edge_stroke_width(amount: f64) -> f32 {
    (amount.max(0.0).sqrt() + 1.0) as f32
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn fade_color(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32, palette: &Palette) {
    painter.rect_filled(rect, 0.0, palette.background);

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, palette.grid);

    let mut x = origin.x.rem_euclid(step) + rect.left();
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step) + rect.top();
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Control point of the quadratic arc from `start` to `end`. The arc bows to
/// the left of the travel direction, so `a -> b` and `b -> a` never overlap.
pub(super) fn arc_control_point(start: Pos2, end: Pos2, bend: f32) -> Pos2 {
    let chord = end - start;
    let normal = vec2(chord.y, -chord.x);
    start + chord * 0.5 + normal * bend
}

pub(super) fn quadratic_point(points: [Pos2; 3], t: f32) -> Pos2 {
    let [p0, p1, p2] = points;
    let inverse = 1.0 - t;
    Pos2::new(
        inverse * inverse * p0.x + 2.0 * inverse * t * p1.x + t * t * p2.x,
        inverse * inverse * p0.y + 2.0 * inverse * t * p1.y + t * t * p2.y,
    )
}

/// Unit direction of travel where the arc enters its end point.
pub(super) fn arc_end_direction(points: [Pos2; 3]) -> Vec2 {
    let [p0, p1, p2] = points;
    let tangent = p2 - p1;
    if tangent.length_sq() > 1e-6 {
        tangent.normalized()
    } else {
        (p2 - p0).normalized()
    }
}

/// Cubic loop leaving and re-entering the top of a node's circle. `lift`
/// is the loop height in node radii.
pub(super) fn self_loop_points(center: Pos2, radius: f32, lift: f32) -> [Pos2; 4] {
    [
        center + vec2(-0.5, -0.87) * radius,
        center + vec2(-1.2, -lift) * radius,
        center + vec2(1.2, -lift) * radius,
        center + vec2(0.5, -0.87) * radius,
    ]
}

pub(super) fn cubic_point(points: [Pos2; 4], t: f32) -> Pos2 {
    let [p0, p1, p2, p3] = points;
    let inverse = 1.0 - t;
    let a = inverse * inverse * inverse;
    let b = 3.0 * inverse * inverse * t;
    let c = 3.0 * inverse * t * t;
    let d = t * t * t;
    Pos2::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

pub(super) fn loop_end_direction(points: [Pos2; 4]) -> Vec2 {
    (points[3] - points[2]).normalized()
}

pub(super) fn draw_arrowhead(painter: &Painter, tip: Pos2, direction: Vec2, size: f32, color: Color32) {
    let back = tip - direction * size;
    let side = vec2(-direction.y, direction.x) * (size * 0.5);
    painter.add(egui::Shape::convex_polygon(
        vec![tip, back + side, back - side],
        color,
        Stroke::NONE,
    ));
}
