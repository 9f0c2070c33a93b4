use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadCell;

const MIN_DISTANCE_SQ: f32 = 1.0;

/// Deterministic stand-in direction for coincident points.
fn jiggle(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

pub(super) struct LinkSpring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

/// Many-body charge. A negative `strength` repels; the velocity change falls
/// off with the inverse of the distance.
pub(super) fn accumulate_charge(
    cell: &QuadCell,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    alpha: f32,
    theta: f32,
    velocity: &mut Vec2,
) {
    if cell.weight <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.members {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            let mut distance_sq = delta.length_sq();
            if distance_sq < 1e-9 {
                delta = jiggle(index, other);
                distance_sq = delta.length_sq();
            }
            if distance_sq < MIN_DISTANCE_SQ {
                distance_sq = (MIN_DISTANCE_SQ * distance_sq).sqrt();
            }
            *velocity += delta * (strength * alpha / distance_sq);
        }
        return;
    }

    let delta = cell.centroid - point;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let far_enough = !cell.bounds.contains(point)
        && cell.bounds.side() * cell.bounds.side() < theta * theta * distance_sq;
    if far_enough {
        *velocity += delta * (strength * alpha * cell.weight / distance_sq);
        return;
    }

    for child in cell.children() {
        accumulate_charge(child, index, positions, strength, alpha, theta, velocity);
    }
}

/// Springs pull each linked pair toward `rest_length`, looking one step ahead
/// with the current velocities. Heavier endpoints move less (`bias`).
pub(super) fn apply_springs(
    springs: &[LinkSpring],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    rest_length: f32,
    alpha: f32,
) {
    for spring in springs {
        let (source, target) = (spring.source, spring.target);
        if source == target || source >= positions.len() || target >= positions.len() {
            continue;
        }

        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta.length_sq() < 1e-9 {
            delta = jiggle(source, target);
        }
        let distance = delta.length();
        let stretch = (distance - rest_length) / distance * alpha * spring.strength;
        let correction = delta * stretch;

        velocities[target] -= correction * spring.bias;
        velocities[source] += correction * (1.0 - spring.bias);
    }
}

/// Weak per-axis pull toward `center`.
pub(super) fn apply_axis_pull(
    positions: &[Vec2],
    velocities: &mut [Vec2],
    center: Vec2,
    strength: f32,
    alpha: f32,
) {
    for (position, velocity) in positions.iter().zip(velocities.iter_mut()) {
        *velocity += (center - *position) * (strength * alpha);
    }
}

/// Shifts every point so the mean position sits on `center`.
pub(super) fn recenter(positions: &mut [Vec2], center: Vec2) {
    if positions.is_empty() {
        return;
    }
    let mean = positions.iter().fold(Vec2::ZERO, |sum, point| sum + *point) / positions.len() as f32;
    let shift = center - mean;
    if shift.length_sq() <= 1e-12 {
        return;
    }
    for position in positions {
        *position += shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_charge_pushes_points_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadCell::build(&positions).expect("tree");
        let mut velocity = Vec2::ZERO;

        accumulate_charge(&tree, 0, &positions, -300.0, 1.0, 0.9, &mut velocity);

        assert!(velocity.x < 0.0);
        assert!((velocity.x + 30.0).abs() < 1e-3);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let positions = vec![vec2(0.0, 0.0), vec2(300.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO; 2];
        let springs = [LinkSpring {
            source: 0,
            target: 1,
            strength: 1.0,
            bias: 0.5,
        }];

        apply_springs(&springs, &positions, &mut velocities, 150.0, 1.0);

        assert!(velocities[0].x > 0.0);
        assert!(velocities[1].x < 0.0);
        assert!((velocities[0].x - 75.0).abs() < 1e-3);
    }

    #[test]
    fn recenter_moves_the_mean_to_the_center() {
        let mut positions = vec![vec2(10.0, 10.0), vec2(30.0, 50.0)];

        recenter(&mut positions, Vec2::ZERO);

        let mean = (positions[0] + positions[1]) * 0.5;
        assert!(mean.length() < 1e-4);
        assert_eq!(positions[1] - positions[0], vec2(20.0, 40.0));
    }
}
