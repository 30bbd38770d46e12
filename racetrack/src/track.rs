use std::fs;
use std::path::Path;
use std::str::FromStr;

use parry2d::shape::Segment;

use crate::algebra_2d::{direction, distance_to_segment, normalize_degrees, ray_segment_intersection, ring_contains, ring_edges, Pos2};
use crate::error::RaceTrackError;

/// Sensor range reported when a ray leaves the track without hitting anything
pub const DEFAULT_MAX_SENSOR_RANGE: f32 = 100.0;

/// Marks the start of another boundary ring inside a track definition
const RING_SEPARATOR: &str = "-";

/// Position plus heading. `heading` is in degrees within `[0, 360)`, 0° pointing along +x.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, heading: f32) -> Self {
        Self {
            x,
            y,
            heading: normalize_degrees(heading),
        }
    }

    pub fn position(&self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }
}

/// Finish area given by two opposite corners.
///
/// A position counts as arrived when its x lies between both corners (inclusive)
/// and its y is at or beyond the lower y of both corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinishZone {
    pub top_left: Pos2,
    pub bottom_right: Pos2,
}

impl FinishZone {
    pub fn new(top_left: Pos2, bottom_right: Pos2) -> Self {
        Self { top_left, bottom_right }
    }

    pub fn contains(&self, position: &Pos2) -> bool {
        let min_x = f32::min(self.top_left.x, self.bottom_right.x);
        let max_x = f32::max(self.top_left.x, self.bottom_right.x);
        let near_y = f32::min(self.top_left.y, self.bottom_right.y);
        (min_x..=max_x).contains(&position.x) && position.y >= near_y
    }
}

/// Closed rings of vertices enclosing the drivable area
#[derive(Clone, Debug)]
pub struct TrackBoundary {
    rings: Vec<Vec<Pos2>>,
    segments: Vec<Segment>,
}

impl TrackBoundary {
    /// Each ring needs at least three vertices. A ring is closed implicitly if its last vertex differs from the first.
    pub fn new(rings: Vec<Vec<Pos2>>) -> Option<Self> {
        if rings.is_empty() || rings.iter().any(|r| r.len() < 3) {
            return None;
        }
        let segments = rings
            .iter()
            .flat_map(|ring| ring_edges(ring).map(|(a, b)| Segment::new(*a, *b)))
            .collect();
        Some(Self { rings, segments })
    }

    pub fn rings(&self) -> &[Vec<Pos2>] {
        &self.rings
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Inside the drivable area, using the even-odd rule over all rings (inner rings cut holes)
    pub fn contains(&self, point: &Pos2) -> bool {
        self.rings
            .iter()
            .filter(|ring| ring_contains(ring, point))
            .count()
            % 2
            == 1
    }
}

/// Static track layout: boundary, start pose and finish zone. Read-only after loading.
#[derive(Clone, Debug)]
pub struct TrackGeometry {
    start: Pose,
    finish: FinishZone,
    boundary: TrackBoundary,
    max_sensor_range: f32,
}

impl TrackGeometry {
    pub fn new(start: Pose, finish: FinishZone, boundary: TrackBoundary) -> Self {
        Self {
            start,
            finish,
            boundary,
            max_sensor_range: DEFAULT_MAX_SENSOR_RANGE,
        }
    }

    pub fn with_max_sensor_range(mut self, max_sensor_range: f32) -> Self {
        self.max_sensor_range = max_sensor_range;
        self
    }

    pub fn load(path: &Path) -> Result<Self, RaceTrackError> {
        let content = fs::read_to_string(path).map_err(|source| RaceTrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let track: TrackGeometry = content.parse()?;
        log::info!(
            "loaded track {} ({} boundary segments, start {:?})",
            path.display(),
            track.boundary.segments().len(),
            track.start
        );
        Ok(track)
    }

    pub fn start(&self) -> Pose {
        self.start
    }

    pub fn finish(&self) -> &FinishZone {
        &self.finish
    }

    pub fn boundary(&self) -> &TrackBoundary {
        &self.boundary
    }

    pub fn max_sensor_range(&self) -> f32 {
        self.max_sensor_range
    }

    /// Distance to the nearest boundary hit of a ray, if any segment is hit at all
    pub fn cast_ray(&self, origin: &Pos2, direction_degrees: f32) -> Option<f32> {
        let dir = direction(direction_degrees);
        self.boundary
            .segments()
            .iter()
            .filter_map(|segment| ray_segment_intersection(origin, &dir, segment))
            .min_by(f32::total_cmp)
    }

    /// Like [Self::cast_ray], falling back to the maximum sensor range when nothing is hit
    /// (which only happens on tracks which are not closed)
    pub fn distance_to_boundary(&self, origin: &Pos2, direction_degrees: f32) -> f32 {
        match self.cast_ray(origin, direction_degrees) {
            Some(distance) => distance,
            None => {
                log::trace!("ray from {:?} at {:.1}° left the track", origin, direction_degrees);
                self.max_sensor_range
            }
        }
    }

    pub fn point_in_finish_zone(&self, position: &Pos2) -> bool {
        self.finish.contains(position)
    }

    pub fn is_outside(&self, position: &Pos2) -> bool {
        !self.boundary.contains(position)
    }

    /// Distance to the closest boundary segment
    pub fn clearance(&self, position: &Pos2) -> f32 {
        self.boundary
            .segments()
            .iter()
            .map(|segment| distance_to_segment(position, segment))
            .fold(f32::INFINITY, f32::min)
    }

    /// Outside of the track, or closer than `min_clearance` to a wall
    pub fn collides(&self, position: &Pos2, min_clearance: f32) -> bool {
        self.is_outside(position) || self.clearance(position) < min_clearance
    }
}

fn parse_floats<const N: usize>(line_no: usize, line: &str) -> Result<[f32; N], RaceTrackError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != N {
        return Err(RaceTrackError::track_format(
            line_no,
            format!("expected {} comma separated numbers, found {}: '{}'", N, fields.len(), line),
        ));
    }
    let mut values = [0.0_f32; N];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = field
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RaceTrackError::track_format(line_no, format!("'{}' is not a finite number", field)))?;
    }
    Ok(values)
}

fn parse_point(line_no: usize, line: &str) -> Result<Pos2, RaceTrackError> {
    let [x, y] = parse_floats::<2>(line_no, line)?;
    Ok(Pos2::new(x, y))
}

/// Track definition format:
/// ```text
/// start_x,start_y,start_heading_degrees
/// finish_top_left_x,finish_top_left_y
/// finish_bottom_right_x,finish_bottom_right_y
/// x,y          <- boundary vertices, one per line
/// ...
/// ```
/// A blank line or a line holding only `-` inside the vertex section starts another ring.
impl FromStr for TrackGeometry {
    type Err = RaceTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().enumerate().map(|(i, line)| (i + 1, line.trim()));

        let mut header_line = |what: &str| {
            lines
                .next()
                .ok_or_else(|| RaceTrackError::track_format(0, format!("missing {}", what)))
        };
        let (n, line) = header_line("start pose")?;
        let [x, y, heading] = parse_floats::<3>(n, line)?;
        let (n, line) = header_line("finish zone top-left corner")?;
        let top_left = parse_point(n, line)?;
        let (n, line) = header_line("finish zone bottom-right corner")?;
        let bottom_right = parse_point(n, line)?;

        let mut rings: Vec<Vec<Pos2>> = vec![vec![]];
        let mut last_line = 3;
        for (n, line) in lines {
            last_line = n;
            if line.is_empty() || line == RING_SEPARATOR {
                if rings.last().is_some_and(|r| !r.is_empty()) {
                    rings.push(vec![]);
                }
                continue;
            }
            if let Some(ring) = rings.last_mut() {
                ring.push(parse_point(n, line)?);
            }
        }
        rings.retain(|r| !r.is_empty());

        let boundary = TrackBoundary::new(rings)
            .ok_or_else(|| RaceTrackError::track_format(last_line, "every boundary ring needs at least 3 vertices"))?;

        Ok(TrackGeometry::new(
            Pose::new(x, y, heading),
            FinishZone::new(top_left, bottom_right),
            boundary,
        ))
    }
}
