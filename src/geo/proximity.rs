use super::{Coordinates, Segment};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

pub fn distance_between(a: &Coordinates, b: &Coordinates) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Projects `point` onto a plane tangent at `origin`, in metres.
/// Good enough for the few hundred metres a segment spans.
fn project(origin: &Coordinates, point: &Coordinates) -> (f64, f64) {
    let x = (point.lon - origin.lon).to_radians() * origin.lat.to_radians().cos() * EARTH_RADIUS_M;
    let y = (point.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
    (x, y)
}

/// Shortest distance in metres from `point` to the segment `start`-`end`.
pub fn point_to_segment_distance(point: &Coordinates, start: &Coordinates, end: &Coordinates) -> f64 {
    // point sits at the origin of the projection
    let (ax, ay) = project(point, start);
    let (bx, by) = project(point, end);
    let dx = bx - ax;
    let dy = by - ay;
    let length_sq = dx * dx + dy * dy;

    let t = if length_sq == 0.0 {
        0.0
    } else {
        (-(ax * dx + ay * dy) / length_sq).clamp(0.0, 1.0)
    };

    let px = ax + t * dx;
    let py = ay + t * dy;
    (px * px + py * py).sqrt()
}

/// How far the `query` segment strays from `reference`: the larger of its two
/// endpoints' distances to the reference segment.
pub fn segment_proximity(query: &Segment, reference: &Segment) -> f64 {
    let from_start = point_to_segment_distance(&query.start, &reference.start, &reference.end);
    let from_end = point_to_segment_distance(&query.end, &reference.start, &reference.end);
    from_start.max(from_end)
}

/// Distance from `point` to a polyline. `None` for an empty path.
pub fn distance_to_path(point: &Coordinates, path: &[Coordinates]) -> Option<f64> {
    match path {
        [] => None,
        [single] => Some(distance_between(point, single)),
        _ => path
            .windows(2)
            .map(|pair| point_to_segment_distance(point, &pair[0], &pair[1]))
            .min_by(|a, b| a.total_cmp(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s1() -> Segment {
        Segment::new(
            Coordinates::new(33.95684, -83.97971),
            Coordinates::new(33.95653, -83.97973),
        )
    }

    #[test]
    fn haversine_matches_known_short_distance() {
        let segment = s1();
        let dist = distance_between(&segment.start, &segment.end);
        assert!(dist > 34.0 && dist < 35.0, "got {dist}");
    }

    #[test]
    fn point_on_segment_is_zero_distance() {
        let segment = s1();
        let midpoint = Coordinates::new(
            (segment.start.lat + segment.end.lat) / 2.0,
            (segment.start.lon + segment.end.lon) / 2.0,
        );
        let dist = point_to_segment_distance(&midpoint, &segment.start, &segment.end);
        assert!(dist < 0.01, "got {dist}");
    }

    #[test]
    fn point_beyond_endpoint_measures_to_endpoint() {
        let start = Coordinates::new(33.95, -83.98);
        let end = Coordinates::new(33.951, -83.98);
        let beyond = Coordinates::new(33.952, -83.98);
        let dist = point_to_segment_distance(&beyond, &start, &end);
        let expected = distance_between(&beyond, &end);
        assert!((dist - expected).abs() < 0.5, "got {dist}, expected {expected}");
    }

    #[test]
    fn identical_segments_have_zero_proximity() {
        assert!(segment_proximity(&s1(), &s1()) < 0.01);
    }

    #[test]
    fn path_distance_uses_nearest_piece() {
        let path = vec![
            Coordinates::new(33.95, -83.98),
            Coordinates::new(33.951, -83.98),
            Coordinates::new(33.951, -83.979),
        ];
        let on_second_piece = Coordinates::new(33.951, -83.9795);
        let dist = distance_to_path(&on_second_piece, &path).unwrap();
        assert!(dist < 0.5, "got {dist}");
        assert_eq!(distance_to_path(&on_second_piece, &[]), None);
    }
}
