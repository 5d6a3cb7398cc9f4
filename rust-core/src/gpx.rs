//! Navigable routes from GPX files.
//!
//! Wraps the `gpx` crate. Every GPX route, and every track after
//! simplification, becomes a `Route` whose maneuvers are derived from the
//! change of heading at each waypoint. GPX carries no timing, so step
//! durations are estimated from the transport mode's average speed.

use std::io::Read;

use crate::convert::simplify;
use crate::error::{NavError, Result};
use crate::geo::{bearing, distance, path_length, Coordinate};
use crate::instruction::{instruction, Locale};
use crate::route::{ManeuverKind, Route, Step, TransportMode};

/// Simplification applied to recorded tracks before deriving maneuvers.
pub const TRACK_TOLERANCE_M: f64 = 25.0;

/// Read a GPX document and build one route per GPX route and track.
///
/// Routes come first, then tracks, each in file order. Entries with fewer
/// than two points are skipped.
pub fn routes_from_gpx<R: Read>(reader: R, mode: TransportMode, locale: Locale) -> Result<Vec<Route>> {
    let gpx = gpx::read(reader).map_err(|e| NavError::Gpx(e.to_string()))?;

    let mut routes = Vec::new();

    for r in &gpx.routes {
        let points = r
            .points
            .iter()
            .map(|wp| Coordinate::new(wp.point().y(), wp.point().x()))
            .collect::<Result<Vec<_>>>()?;
        if let Some(route) = build_route(points.clone(), &points, mode, locale)? {
            routes.push(route);
        }
    }

    for t in &gpx.tracks {
        let points = t
            .segments
            .iter()
            .flat_map(|seg| seg.points.iter())
            .map(|wp| Coordinate::new(wp.point().y(), wp.point().x()))
            .collect::<Result<Vec<_>>>()?;
        let waypoints = simplify(&points, TRACK_TOLERANCE_M);
        if let Some(route) = build_route(points, &waypoints, mode, locale)? {
            routes.push(route);
        }
    }

    if routes.is_empty() {
        return Err(NavError::Gpx("no route or track with at least two points".into()));
    }

    log::info!("built {} route(s) from GPX", routes.len());
    Ok(routes)
}

/// Convenience wrapper for JNI.
pub fn routes_from_gpx_bytes(data: &[u8], mode: TransportMode, locale: Locale) -> Result<Vec<Route>> {
    routes_from_gpx(data, mode, locale)
}

/// `path` is drawn on the map, `waypoints` carry the maneuvers.
fn build_route(
    path: Vec<Coordinate>,
    waypoints: &[Coordinate],
    mode: TransportMode,
    locale: Locale,
) -> Result<Option<Route>> {
    if waypoints.len() < 2 {
        log::debug!("skipping GPX entry with {} point(s)", waypoints.len());
        return Ok(None);
    }

    let step = |kind: ManeuverKind, modifier: Option<&str>, at: Coordinate, distance_m: f64| Step {
        instruction: instruction(kind, modifier, None, distance_m, locale),
        distance_m,
        duration_s: mode.estimate_duration_s(distance_m),
        maneuver: kind,
        modifier: modifier.map(str::to_string),
        road_name: None,
        coordinate: at,
    };

    let last = waypoints.len() - 1;
    let mut steps = vec![step(
        ManeuverKind::Depart,
        None,
        waypoints[0],
        distance(&waypoints[0], &waypoints[1]),
    )];

    for i in 1..last {
        let leg = distance(&waypoints[i], &waypoints[i + 1]);
        match turn_modifier(&waypoints[i - 1], &waypoints[i], &waypoints[i + 1]) {
            Some(modifier) => steps.push(step(ManeuverKind::Turn, Some(modifier), waypoints[i], leg)),
            None => {
                // Going straight is not a maneuver, the previous step just gets longer
                if let Some(prev) = steps.last_mut() {
                    *prev = step(prev.maneuver, prev.modifier.as_deref(), prev.coordinate, prev.distance_m + leg);
                }
            }
        }
    }

    steps.push(step(ManeuverKind::Arrive, None, waypoints[last], 0.0));

    let distance_m = path_length(&path);
    let duration_s = mode.estimate_duration_s(distance_m);
    Route::new(path, distance_m, duration_s, steps, mode).map(Some)
}

/// Modifier for the turn at `b` when arriving from `a` and leaving toward
/// `c`, or None when the heading barely changes.
fn turn_modifier(a: &Coordinate, b: &Coordinate, c: &Coordinate) -> Option<&'static str> {
    // Relative angle: positive = right turn, negative = left turn
    let mut angle = bearing(b, c) - bearing(a, b);
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle < -180.0 {
        angle += 360.0;
    }

    let right = angle > 0.0;
    match angle.abs() {
        a if a > 170.0 => Some("uturn"),
        a if a > 120.0 => Some(if right { "sharp right" } else { "sharp left" }),
        a if a > 60.0 => Some(if right { "right" } else { "left" }),
        a if a > 20.0 => Some(if right { "slight right" } else { "slight left" }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn parse(gpx: &str) -> Result<Vec<Route>> {
        routes_from_gpx_bytes(gpx.as_bytes(), TransportMode::Cycling, Locale::En)
    }

    const ROUTE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <rte>
    <name>North then east</name>
    <rtept lat="48.0" lon="16.0"></rtept>
    <rtept lat="48.005" lon="16.0"></rtept>
    <rtept lat="48.01" lon="16.0"></rtept>
    <rtept lat="48.01" lon="16.01"></rtept>
  </rte>
</gpx>"#;

    #[test]
    fn route_points_become_maneuvers() {
        let routes = parse(ROUTE_GPX).unwrap();
        assert_eq!(routes.len(), 1);

        let steps = routes[0].steps();
        // The straight waypoint at 48.005 merges into the departure
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].maneuver, ManeuverKind::Depart);
        assert_eq!(steps[1].maneuver, ManeuverKind::Turn);
        assert_eq!(steps[1].modifier.as_deref(), Some("right"));
        assert_eq!(steps[1].instruction, "Turn right onto the road");
        assert_eq!(steps[2].maneuver, ManeuverKind::Arrive);

        // ~1112 m north before the turn
        assert!((steps[0].distance_m - 1112.0).abs() < 5.0, "{}", steps[0].distance_m);
        assert!((steps[1].coordinate.lat() - 48.01).abs() < 1e-9);
        assert_eq!(routes[0].coordinates().len(), 4);
        assert_eq!(routes[0].mode(), TransportMode::Cycling);
    }

    #[test]
    fn durations_use_average_speed() {
        let routes = parse(ROUTE_GPX).unwrap();
        let step = &routes[0].steps()[0];
        let expected = step.distance_m / (15.0 / 3.6);
        assert!((step.duration_s - expected).abs() < 1e-6);
        assert!((routes[0].duration_s() - routes[0].distance_m() / (15.0 / 3.6)).abs() < 1e-6);
    }

    #[test]
    fn tracks_are_simplified() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="48.0" lon="16.0"></trkpt>
      <trkpt lat="48.0" lon="16.005"></trkpt>
      <trkpt lat="48.0" lon="16.01"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="48.005" lon="16.01"></trkpt>
      <trkpt lat="48.01" lon="16.01"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

        let routes = parse(gpx).unwrap();
        let route = &routes[0];
        // All recorded points are drawn
        assert_eq!(route.coordinates().len(), 5);
        // East then a left turn north
        assert_eq!(route.steps().len(), 3);
        assert_eq!(route.steps()[1].modifier.as_deref(), Some("left"));
    }

    #[test]
    fn too_short_entries_are_skipped() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <rte><rtept lat="48.0" lon="16.0"></rtept></rte>
</gpx>"#;
        assert!(matches!(parse(gpx), Err(NavError::Gpx(_))));
    }

    #[test]
    fn invalid_xml_returns_error() {
        assert!(matches!(parse("not xml at all"), Err(NavError::Gpx(_))));
    }

    #[test]
    fn classify_turns() {
        let a = pt(48.0, 16.0);
        let b = pt(48.01, 16.0);
        assert_eq!(turn_modifier(&a, &b, &pt(48.02, 16.0)), None);
        assert_eq!(turn_modifier(&a, &b, &pt(48.01, 16.01)), Some("right"));
        assert_eq!(turn_modifier(&a, &b, &pt(48.01, 15.99)), Some("left"));
        assert_eq!(turn_modifier(&a, &b, &pt(48.02, 16.01)), Some("slight right"));
        assert_eq!(turn_modifier(&a, &b, &pt(48.0, 16.0001)), Some("uturn"));
        assert_eq!(turn_modifier(&a, &b, &pt(48.005, 15.995)), Some("sharp left"));
    }
}
