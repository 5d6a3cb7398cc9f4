//! Route and maneuver model.
//!
//! A `Route` is built once, either from a routing-service response
//! (see `response`) or from a GPX file (see `gpx`), and is never mutated
//! afterwards. Sessions and UI code only read it.

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::geo::Coordinate;

/// Maneuver categories as reported by the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    Turn,
    NewName,
    Depart,
    Arrive,
    Merge,
    OnRamp,
    OffRamp,
    Fork,
    EndOfRoad,
    Continue,
    Roundabout,
    Rotary,
    ExitRoundabout,
    Notification,
}

impl ManeuverKind {
    pub const ALL: [ManeuverKind; 14] = [
        ManeuverKind::Turn,
        ManeuverKind::NewName,
        ManeuverKind::Depart,
        ManeuverKind::Arrive,
        ManeuverKind::Merge,
        ManeuverKind::OnRamp,
        ManeuverKind::OffRamp,
        ManeuverKind::Fork,
        ManeuverKind::EndOfRoad,
        ManeuverKind::Continue,
        ManeuverKind::Roundabout,
        ManeuverKind::Rotary,
        ManeuverKind::ExitRoundabout,
        ManeuverKind::Notification,
    ];

    /// Map a wire maneuver type ("end of road", "on ramp", ...) to a kind.
    ///
    /// Matching ignores case and surrounding whitespace. Unknown values
    /// become `Continue`.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "turn" => ManeuverKind::Turn,
            "new name" => ManeuverKind::NewName,
            "depart" => ManeuverKind::Depart,
            "arrive" => ManeuverKind::Arrive,
            "merge" => ManeuverKind::Merge,
            "on ramp" => ManeuverKind::OnRamp,
            "off ramp" => ManeuverKind::OffRamp,
            "fork" => ManeuverKind::Fork,
            "end of road" => ManeuverKind::EndOfRoad,
            "continue" => ManeuverKind::Continue,
            "roundabout" => ManeuverKind::Roundabout,
            "rotary" => ManeuverKind::Rotary,
            "exit roundabout" => ManeuverKind::ExitRoundabout,
            "notification" => ManeuverKind::Notification,
            other => {
                log::debug!("unknown maneuver type {other:?}, treating as continue");
                ManeuverKind::Continue
            }
        }
    }
}

/// How the route is travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    Car,
    Walking,
    Cycling,
    PublicTransport,
}

impl TransportMode {
    /// Routing profile requested from the service. Transit is not offered
    /// by the service, so it falls back to the car profile.
    pub fn profile(&self) -> &'static str {
        match self {
            TransportMode::Car | TransportMode::PublicTransport => "car",
            TransportMode::Walking => "foot",
            TransportMode::Cycling => "bike",
        }
    }

    /// Typical travel speed in km/h, used when a route carries no timing.
    pub fn average_speed_kmh(&self) -> f64 {
        match self {
            TransportMode::Car => 50.0,
            TransportMode::Walking => 5.0,
            TransportMode::Cycling => 15.0,
            TransportMode::PublicTransport => 30.0,
        }
    }

    /// Seconds needed to cover `distance_m` at the mode's average speed.
    pub fn estimate_duration_s(&self, distance_m: f64) -> f64 {
        distance_m / (self.average_speed_kmh() / 3.6)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "car" | "driving" => Some(TransportMode::Car),
            "walking" | "foot" => Some(TransportMode::Walking),
            "cycling" | "bike" => Some(TransportMode::Cycling),
            "public_transport" | "transit" => Some(TransportMode::PublicTransport),
            _ => None,
        }
    }
}

/// One maneuver and the stretch of road that follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub instruction: String,
    pub distance_m: f64,
    pub duration_s: f64,
    pub maneuver: ManeuverKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_name: Option<String>,
    /// Where the maneuver takes place.
    pub coordinate: Coordinate,
}

/// A complete route, ready to be navigated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRoute")]
pub struct Route {
    coordinates: Vec<Coordinate>,
    distance_m: f64,
    duration_s: f64,
    steps: Vec<Step>,
    mode: TransportMode,
}

#[derive(Deserialize)]
struct RawRoute {
    coordinates: Vec<Coordinate>,
    distance_m: f64,
    duration_s: f64,
    steps: Vec<Step>,
    mode: TransportMode,
}

impl TryFrom<RawRoute> for Route {
    type Error = NavError;

    fn try_from(raw: RawRoute) -> Result<Self> {
        Route::new(raw.coordinates, raw.distance_m, raw.duration_s, raw.steps, raw.mode)
    }
}

impl Route {
    /// Assemble a route, checking that it has at least one step and that
    /// every distance and duration is finite and non-negative.
    pub fn new(
        coordinates: Vec<Coordinate>,
        distance_m: f64,
        duration_s: f64,
        steps: Vec<Step>,
        mode: TransportMode,
    ) -> Result<Self> {
        if steps.is_empty() {
            return Err(NavError::MalformedResponse("route has no steps".into()));
        }
        check_metric("route distance", distance_m)?;
        check_metric("route duration", duration_s)?;
        for (i, step) in steps.iter().enumerate() {
            check_metric(&format!("step {i} distance"), step.distance_m)?;
            check_metric(&format!("step {i} duration"), step.duration_s)?;
        }

        Ok(Self {
            coordinates,
            distance_m,
            duration_s,
            steps,
            mode,
        })
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// Never empty.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn last_step_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// Sum of distance and duration over the steps from `from` onward.
    pub fn remaining_from(&self, from: usize) -> (f64, f64) {
        self.steps
            .iter()
            .skip(from)
            .fold((0.0, 0.0), |(d, t), s| (d + s.distance_m, t + s.duration_s))
    }
}

pub(crate) fn check_metric(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(NavError::MalformedResponse(format!("{field} is {value}")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn step_at(lat: f64, lon: f64, distance_m: f64, duration_s: f64, text: &str) -> Step {
        Step {
            instruction: text.to_string(),
            distance_m,
            duration_s,
            maneuver: ManeuverKind::Turn,
            modifier: None,
            road_name: None,
            coordinate: Coordinate::new(lat, lon).unwrap(),
        }
    }

    #[test]
    fn maneuver_from_wire_ignores_case() {
        assert_eq!(ManeuverKind::from_wire("End Of Road"), ManeuverKind::EndOfRoad);
        assert_eq!(ManeuverKind::from_wire("ON RAMP"), ManeuverKind::OnRamp);
        assert_eq!(ManeuverKind::from_wire("exit roundabout"), ManeuverKind::ExitRoundabout);
    }

    #[test]
    fn unknown_maneuver_is_continue() {
        assert_eq!(ManeuverKind::from_wire("teleport"), ManeuverKind::Continue);
        assert_eq!(ManeuverKind::from_wire(""), ManeuverKind::Continue);
    }

    #[test]
    fn transport_mode_profiles() {
        assert_eq!(TransportMode::PublicTransport.profile(), "car");
        assert_eq!(TransportMode::parse("foot"), Some(TransportMode::Walking));
        assert_eq!(TransportMode::parse("hovercraft"), None);
        assert!((TransportMode::Walking.estimate_duration_s(5000.0) - 3600.0).abs() < 1e-6);
    }

    #[test]
    fn route_requires_steps() {
        let err = Route::new(vec![], 0.0, 0.0, vec![], TransportMode::Car).unwrap_err();
        assert!(matches!(err, NavError::MalformedResponse(_)));
    }

    #[test]
    fn route_rejects_negative_step_distance() {
        let step = step_at(48.0, 16.0, -1.0, 10.0, "x");
        assert!(Route::new(vec![], 0.0, 0.0, vec![step], TransportMode::Car).is_err());
    }

    #[test]
    fn remaining_sums_tail() {
        let steps = vec![
            step_at(48.0, 16.0, 100.0, 10.0, "a"),
            step_at(48.1, 16.0, 200.0, 20.0, "b"),
            step_at(48.2, 16.0, 300.0, 30.0, "c"),
        ];
        let route = Route::new(vec![], 600.0, 60.0, steps, TransportMode::Car).unwrap();
        assert_eq!(route.remaining_from(0), (600.0, 60.0));
        assert_eq!(route.remaining_from(2), (300.0, 30.0));
        assert_eq!(route.remaining_from(3), (0.0, 0.0));
    }

    #[test]
    fn route_json_round_trip_revalidates() {
        let route = Route::new(
            vec![],
            10.0,
            1.0,
            vec![step_at(48.0, 16.0, 10.0, 1.0, "a")],
            TransportMode::Cycling,
        )
        .unwrap();
        let json = serde_json::to_string(&route).unwrap();
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(back, route);

        let no_steps = r#"{"coordinates":[],"distance_m":0.0,"duration_s":0.0,"steps":[],"mode":"car"}"#;
        assert!(serde_json::from_str::<Route>(no_steps).is_err());
    }
}
