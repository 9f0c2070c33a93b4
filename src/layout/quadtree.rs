use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_side: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (
                vec2(f32::INFINITY, f32::INFINITY),
                vec2(f32::NEG_INFINITY, f32::NEG_INFINITY),
            ),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_side: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_side
            && (point.y - self.center.y).abs() <= self.half_side
    }

    pub(super) fn side(self) -> f32 {
        self.half_side * 2.0
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_side * 0.5;
        let dx = if quadrant & 1 == 0 { -quarter } else { quarter };
        let dy = if quadrant & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(dx, dy),
            half_side: quarter,
        }
    }
}

/// Barnes–Hut cell. Leaves keep their member indices, internal cells only
/// their aggregate weight and centroid.
pub(super) struct QuadCell {
    pub(super) bounds: Square,
    pub(super) centroid: Vec2,
    pub(super) weight: f32,
    pub(super) members: Vec<usize>,
    pub(super) quadrants: [Option<Box<QuadCell>>; 4],
}

impl QuadCell {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let bounds = Square::enclosing(points)?;
        Some(Self::subdivide(bounds, (0..points.len()).collect(), points, 0))
    }

    fn subdivide(bounds: Square, members: Vec<usize>, points: &[Vec2], depth: usize) -> Self {
        let weight = members.len() as f32;
        let centroid = if members.is_empty() {
            bounds.center
        } else {
            members
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + points[index])
                / weight
        };

        let mut cell = Self {
            bounds,
            centroid,
            weight,
            members,
            quadrants: std::array::from_fn(|_| None),
        };

        if cell.members.len() <= LEAF_CAPACITY || depth >= MAX_DEPTH {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &cell.members {
            buckets[bounds.quadrant_of(points[index])].push(index);
        }

        // Coincident points never separate; keep them in one leaf.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                cell.quadrants[quadrant] = Some(Box::new(Self::subdivide(
                    bounds.quadrant(quadrant),
                    bucket,
                    points,
                    depth + 1,
                )));
            }
        }
        cell.members.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.quadrants.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadCell> {
        self.quadrants.iter().filter_map(|child| child.as_deref())
    }
}
