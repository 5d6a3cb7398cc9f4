//! Routing-service response parsing.
//!
//! The wire types mirror the OSRM `route` service JSON. Numeric fields are
//! optional on the wire so that a missing value surfaces as
//! `MalformedResponse` instead of a generic deserialization failure.
//! Construction is all-or-nothing: one bad step rejects the whole response.

use serde::Deserialize;

use crate::error::{NavError, Result};
use crate::geo::Coordinate;
use crate::instruction::{instruction, Locale};
use crate::polyline;
use crate::route::{check_metric, ManeuverKind, Route, Step, TransportMode};

/// Status code the service uses for success.
const STATUS_OK: &str = "Ok";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteResponse {
    pub code: String,
    #[serde(default)]
    pub routes: Option<Vec<WireRoute>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireRoute {
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    /// Full-route polyline, when the service was asked for an overview.
    pub geometry: Option<String>,
    #[serde(default)]
    pub legs: Vec<WireLeg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireLeg {
    #[serde(default)]
    pub steps: Vec<WireStep>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireStep {
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub geometry: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub maneuver: WireManeuver,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireManeuver {
    /// `[lon, lat]`
    pub location: Option<Vec<f64>>,
    /// Absent type reads as "continue", like any unknown one.
    #[serde(rename = "type", default)]
    pub kind: String,
    pub modifier: Option<String>,
}

/// Build every candidate route of a response. The first route is the
/// service's preferred one, the others are alternatives.
pub fn parse_routes(response: &RouteResponse, mode: TransportMode, locale: Locale) -> Result<Vec<Route>> {
    let routes = match (&response.code, &response.routes) {
        (code, Some(routes)) if code == STATUS_OK && !routes.is_empty() => routes,
        (code, _) => {
            log::warn!("routing service returned {code}: {:?}", response.message);
            return Err(NavError::RouteNotFound {
                message: response.message.clone(),
            });
        }
    };

    let parsed = routes
        .iter()
        .enumerate()
        .map(|(i, r)| {
            parse_route(r, mode, locale).map_err(|e| {
                log::warn!("rejecting response, route {i} is invalid: {e}");
                e
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("parsed {} route(s) from routing response", parsed.len());
    Ok(parsed)
}

/// Parse a JSON routing response.
pub fn parse_routes_json(json: &str, mode: TransportMode, locale: Locale) -> Result<Vec<Route>> {
    let response: RouteResponse = serde_json::from_str(json)
        .map_err(|e| NavError::MalformedResponse(e.to_string()))?;
    parse_routes(&response, mode, locale)
}

fn parse_route(wire: &WireRoute, mode: TransportMode, locale: Locale) -> Result<Route> {
    let distance_m = required("route distance", wire.distance)?;
    let duration_s = required("route duration", wire.duration)?;

    // Leg boundaries are not kept, steps are flattened in order
    let wire_steps: Vec<&WireStep> = wire.legs.iter().flat_map(|leg| leg.steps.iter()).collect();

    let steps = wire_steps
        .iter()
        .enumerate()
        .map(|(i, s)| parse_step(i, s, locale))
        .collect::<Result<Vec<_>>>()?;

    let coordinates = match wire.geometry.as_deref().filter(|g| !g.is_empty()) {
        Some(geometry) => polyline::decode(geometry)?,
        None => concat_step_geometries(&wire_steps)?,
    };

    Route::new(coordinates, distance_m, duration_s, steps, mode)
}

fn parse_step(index: usize, wire: &WireStep, locale: Locale) -> Result<Step> {
    let distance_m = required(&format!("step {index} distance"), wire.distance)?;
    let duration_s = required(&format!("step {index} duration"), wire.duration)?;
    let maneuver = ManeuverKind::from_wire(&wire.maneuver.kind);
    let modifier = wire.maneuver.modifier.clone();
    let road_name = wire.name.clone().filter(|n| !n.trim().is_empty());
    let coordinate = maneuver_coordinate(index, wire)?;

    let instruction = instruction(
        maneuver,
        modifier.as_deref(),
        road_name.as_deref(),
        distance_m,
        locale,
    );

    Ok(Step {
        instruction,
        distance_m,
        duration_s,
        maneuver,
        modifier,
        road_name,
        coordinate,
    })
}

/// The maneuver location is sent as `[lon, lat]`. Without it, fall back
/// to the first point of the step's own geometry.
fn maneuver_coordinate(index: usize, wire: &WireStep) -> Result<Coordinate> {
    match wire.maneuver.location.as_deref() {
        Some(&[lon, lat]) => Coordinate::from_lon_lat([lon, lat]),
        Some(other) => Err(NavError::MalformedResponse(format!(
            "step {index} maneuver location has {} values, expected 2",
            other.len()
        ))),
        None => wire
            .geometry
            .as_deref()
            .map(polyline::decode)
            .transpose()?
            .and_then(|points| points.into_iter().next())
            .ok_or_else(|| {
                NavError::MalformedResponse(format!("step {index} has neither location nor geometry"))
            }),
    }
}

fn concat_step_geometries(steps: &[&WireStep]) -> Result<Vec<Coordinate>> {
    let mut coordinates: Vec<Coordinate> = Vec::new();
    for step in steps {
        let Some(geometry) = step.geometry.as_deref() else {
            continue;
        };
        for point in polyline::decode(geometry)? {
            // Consecutive fragments share their junction point
            if coordinates.last() != Some(&point) {
                coordinates.push(point);
            }
        }
    }
    Ok(coordinates)
}

fn required(field: &str, value: Option<f64>) -> Result<f64> {
    let value = value.ok_or_else(|| NavError::MalformedResponse(format!("{field} is missing")))?;
    check_metric(field, value)
}
