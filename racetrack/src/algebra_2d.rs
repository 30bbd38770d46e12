use parry2d::math::{Point, Vector};
use parry2d::query::PointQuery;
use parry2d::shape::Segment;

pub type Pos2 = Point<f32>;
pub type Vec2 = Vector<f32>;

/// below that, a ray and a segment count as parallel
const PARALLEL_EPSILON: f32 = 1e-6;
/// tolerance on the segment parameter, so rays through a shared vertex hit at least one of both segments
const SEGMENT_PARAM_SLACK: f32 = 1e-5;

/// Maps any angle to `[0, 360)`
pub fn normalize_degrees(degrees: f32) -> f32 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative value rounds up to 360.0
    if d >= 360.0 { 0.0 } else { d }
}

/// Unit vector; 0° points along +x, 90° along +y
pub fn direction(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// z component of the 3D cross product
pub fn cross(a: &Vec2, b: &Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Distance along the ray `origin + t * dir` (`dir` normalized) to its intersection with `segment`.
///
/// Rays parallel to the segment and zero-length segments yield `None`, just as misses do.
pub fn ray_segment_intersection(origin: &Pos2, dir: &Vec2, segment: &Segment) -> Option<f32> {
    let edge = segment.b - segment.a;
    let edge_len = edge.norm();
    let denom = cross(dir, &edge);
    if edge_len <= f32::EPSILON || denom.abs() <= PARALLEL_EPSILON * edge_len {
        return None;
    }
    let to_start = segment.a - origin;
    let t = cross(&to_start, &edge) / denom;
    let u = cross(&to_start, dir) / denom;
    if t >= 0.0 && (-SEGMENT_PARAM_SLACK..=1.0 + SEGMENT_PARAM_SLACK).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Even-odd rule; `ring` is treated as closed
pub fn ring_contains(ring: &[Pos2], point: &Pos2) -> bool {
    let mut inside = false;
    for (a, b) in ring_edges(ring) {
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Consecutive vertex pairs including the closing edge (skipped when the ring is already closed)
pub fn ring_edges(ring: &[Pos2]) -> impl Iterator<Item = (&Pos2, &Pos2)> {
    let closing = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first != last => Some((last, first)),
        _ => None,
    };
    ring.windows(2).map(|w| (&w[0], &w[1])).chain(closing)
}

pub fn distance_to_segment(point: &Pos2, segment: &Segment) -> f32 {
    segment.distance_to_local_point(point, true)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn segment(ax: f32, ay: f32, bx: f32, by: f32) -> Segment {
        Segment::new(Pos2::new(ax, ay), Pos2::new(bx, by))
    }

    fn square() -> Vec<Pos2> {
        vec![
            Pos2::new(-10.0, -10.0),
            Pos2::new(10.0, -10.0),
            Pos2::new(10.0, 10.0),
            Pos2::new(-10.0, 10.0),
        ]
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(360.0, 0.0)]
    #[case(-90.0, 270.0)]
    #[case(450.0, 90.0)]
    #[case(-1e-6, 0.0)]
    #[case(725.5, 5.5)]
    fn test_normalize_degrees(#[case] input: f32, #[case] expected: f32) {
        let n = normalize_degrees(input);
        assert!((0.0..360.0).contains(&n));
        assert!((n - expected).abs() < 1e-3, "{} -> {}", input, n);
    }

    #[test]
    fn test_direction() {
        let up = direction(90.0);
        assert!(up.x.abs() < 1e-6);
        assert!((up.y - 1.0).abs() < 1e-6);
        let left_down = direction(225.0);
        assert!((left_down.norm() - 1.0).abs() < 1e-6);
        assert!(left_down.x < 0.0 && left_down.y < 0.0);
    }

    #[test]
    fn test_ray_hits_segment_in_front() {
        let hit = ray_segment_intersection(&Pos2::new(0.0, 0.0), &direction(90.0), &segment(-5.0, 7.0, 5.0, 7.0));
        assert!((hit.unwrap() - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_misses_segment_behind_or_aside() {
        let origin = Pos2::new(0.0, 0.0);
        assert_eq!(ray_segment_intersection(&origin, &direction(270.0), &segment(-5.0, 7.0, 5.0, 7.0)), None);
        assert_eq!(ray_segment_intersection(&origin, &direction(90.0), &segment(1.0, 7.0, 5.0, 7.0)), None);
    }

    #[test]
    fn test_parallel_and_degenerate_segments_are_skipped() {
        let origin = Pos2::new(0.0, 0.0);
        // parallel, and even collinear with the ray
        assert_eq!(ray_segment_intersection(&origin, &direction(0.0), &segment(1.0, 3.0, 5.0, 3.0)), None);
        assert_eq!(ray_segment_intersection(&origin, &direction(0.0), &segment(1.0, 0.0, 5.0, 0.0)), None);
        assert_eq!(ray_segment_intersection(&origin, &direction(0.0), &segment(3.0, 0.0, 3.0, 0.0)), None);
    }

    #[test]
    fn test_ray_through_vertex_hits() {
        let origin = Pos2::new(0.0, 0.0);
        let ring = square();
        let dir = direction(45.0);
        let nearest = ring_edges(&ring)
            .filter_map(|(a, b)| ray_segment_intersection(&origin, &dir, &Segment::new(*a, *b)))
            .fold(f32::INFINITY, f32::min);
        assert!((nearest - 200_f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_ring_edges_closes_ring_once() {
        let open = square();
        assert_eq!(ring_edges(&open).count(), 4);
        let mut closed = square();
        closed.push(closed[0]);
        assert_eq!(ring_edges(&closed).count(), 4);
    }

    #[rstest]
    #[case(0.0, 0.0, true)]
    #[case(9.9, -9.9, true)]
    #[case(10.1, 0.0, false)]
    #[case(0.0, -12.0, false)]
    #[case(-50.0, 3.0, false)]
    fn test_ring_contains(#[case] x: f32, #[case] y: f32, #[case] expected: bool) {
        assert_eq!(ring_contains(&square(), &Pos2::new(x, y)), expected);
    }

    #[test]
    fn test_distance_to_segment() {
        let s = segment(0.0, 0.0, 10.0, 0.0);
        assert!((distance_to_segment(&Pos2::new(5.0, 3.0), &s) - 3.0).abs() < 1e-5);
        assert!((distance_to_segment(&Pos2::new(13.0, 4.0), &s) - 5.0).abs() < 1e-5);
    }
}
