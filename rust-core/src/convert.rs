//! Track simplification.
//!
//! Recorded GPS tracks have a point every few meters. Before maneuvers
//! can be derived from one, it is reduced to the points where the path
//! actually changes direction, using Ramer-Douglas-Peucker.

use crate::geo::Coordinate;

/// Simplify a path, keeping every point that deviates more than
/// `tolerance_m` from the simplified line. Endpoints are always kept.
///
/// Typical values:
/// - 10.0: light simplification, keeps most detail
/// - 25.0: good for deriving turn maneuvers
/// - 100.0: aggressive, only major direction changes
pub fn simplify(points: &[Coordinate], tolerance_m: f64) -> Vec<Coordinate> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let first = &points[0];
    let last = &points[points.len() - 1];

    let (max_idx, max_dist) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, perpendicular_distance_m(p, first, last)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_dist > tolerance_m {
        let mut left = simplify(&points[..=max_idx], tolerance_m);
        let right = simplify(&points[max_idx..], tolerance_m);

        // Junction point is in both halves
        left.pop();
        left.extend(right);
        left
    } else {
        vec![*first, *last]
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`, in meters.
///
/// Planar approximation scaled by the cosine of the mean latitude, fine
/// for the short spans found in tracks.
fn perpendicular_distance_m(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> f64 {
    let cos_lat = ((a.lat() + b.lat()) / 2.0).to_radians().cos();

    let m_per_deg_lat = 111_320.0;
    let m_per_deg_lon = 111_320.0 * cos_lat;

    let (ax, ay) = (a.lon() * m_per_deg_lon, a.lat() * m_per_deg_lat);
    let (bx, by) = (b.lon() * m_per_deg_lon, b.lat() * m_per_deg_lat);
    let (px, py) = (p.lon() * m_per_deg_lon, p.lat() * m_per_deg_lat);

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-10 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }

    ((px - ax) * dy - (py - ay) * dx).abs() / len_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn short_paths_are_unchanged() {
        let points = vec![pt(0.0, 0.0), pt(1.0, 1.0)];
        assert_eq!(simplify(&points, 100.0), points);
        assert!(simplify(&[], 10.0).is_empty());
    }

    #[test]
    fn straight_line_collapses_to_endpoints() {
        let points = vec![
            pt(48.0, 16.0),
            pt(48.0, 16.005),
            pt(48.0, 16.01),
            pt(48.0, 16.015),
            pt(48.0, 16.02),
        ];

        let result = simplify(&points, 10.0);
        assert_eq!(result, vec![pt(48.0, 16.0), pt(48.0, 16.02)]);
    }

    #[test]
    fn keeps_corner() {
        // L-shaped: east then north
        let points = vec![
            pt(48.0, 16.0),
            pt(48.0, 16.01),
            pt(48.0, 16.02),
            pt(48.01, 16.02),
            pt(48.02, 16.02),
        ];

        let result = simplify(&points, 10.0);
        assert_eq!(result, vec![pt(48.0, 16.0), pt(48.0, 16.02), pt(48.02, 16.02)]);
    }

    #[test]
    fn zero_tolerance_keeps_wiggles() {
        let points = vec![pt(48.0, 16.0), pt(48.001, 16.001), pt(48.0, 16.002)];
        assert_eq!(simplify(&points, 0.0).len(), 3);
    }
}
