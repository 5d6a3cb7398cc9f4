//! JNI bindings for the Android app.
//!
//! Each public extern here corresponds to an `external fun` declaration
//! in RustBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! Data crosses the boundary as JSON strings. A navigation session lives
//! on the Rust heap and is referenced from Kotlin by an opaque `Long`
//! handle obtained from `sessionCreate` and released by `sessionDestroy`.
//! Data errors are thrown as `IllegalArgumentException`, calls made in
//! the wrong session state as `IllegalStateException`.

use chrono::{DateTime, Utc};
use jni::objects::{JByteArray, JClass, JString};
use jni::sys::{jboolean, jdouble, jlong, jstring, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use serde::Serialize;

use crate::config::NavigationConfig;
use crate::error::{NavError, TransitionError};
use crate::geo::Coordinate;
use crate::gpx::routes_from_gpx_bytes;
use crate::instruction::Locale;
use crate::polyline;
use crate::response::parse_routes_json;
use crate::route::{Route, TransportMode};
use crate::session::{LocationFix, NavEvent, NavigationSession, SessionStatus};

#[derive(Debug, thiserror::Error)]
enum BridgeError {
    #[error(transparent)]
    Data(#[from] NavError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("timestamp out of range: {0} ms")]
    Timestamp(i64),

    #[error("invalid session handle")]
    Handle,

    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),
}

impl BridgeError {
    fn exception_class(&self) -> &'static str {
        match self {
            BridgeError::Transition(_) | BridgeError::Handle => "java/lang/IllegalStateException",
            _ => "java/lang/IllegalArgumentException",
        }
    }
}

/// Events produced by one session call plus the metrics after it.
#[derive(Serialize)]
struct SessionUpdate<'a> {
    events: &'a [NavEvent],
    status: SessionStatus,
}

fn update_json(session: &NavigationSession, events: &[NavEvent]) -> Result<String, BridgeError> {
    let update = SessionUpdate {
        events,
        status: session.status(),
    };
    Ok(serde_json::to_string(&update).map_err(NavError::from)?)
}

fn transport_mode(tag: &str) -> Result<TransportMode, BridgeError> {
    TransportMode::parse(tag)
        .ok_or_else(|| NavError::Config(format!("unknown transport mode {tag:?}")).into())
}

fn locale(tag: &str) -> Result<Locale, BridgeError> {
    Locale::parse(tag).ok_or_else(|| NavError::Config(format!("unsupported locale {tag:?}")).into())
}

fn location_fix(lat: f64, lon: f64, epoch_ms: i64) -> Result<LocationFix, BridgeError> {
    let coordinate = Coordinate::new(lat, lon)?;
    let timestamp = timestamp(epoch_ms)?;
    Ok(LocationFix::new(coordinate, timestamp))
}

fn timestamp(epoch_ms: i64) -> Result<DateTime<Utc>, BridgeError> {
    DateTime::from_timestamp_millis(epoch_ms).ok_or(BridgeError::Timestamp(epoch_ms))
}

fn routes_json(routes: &[Route]) -> Result<String, BridgeError> {
    Ok(serde_json::to_string(routes).map_err(NavError::from)?)
}

fn route_from_json(json: &str) -> Result<Route, BridgeError> {
    Ok(serde_json::from_str(json).map_err(NavError::from)?)
}

fn start_session(
    session: &mut NavigationSession,
    route_json: &str,
    fix: LocationFix,
) -> Result<String, BridgeError> {
    let route = route_from_json(route_json)?;
    let events = session.start(route, fix)?;
    update_json(session, &events)
}

fn update_session(session: &mut NavigationSession, fix: LocationFix) -> Result<String, BridgeError> {
    let events = session.on_location_update(fix)?;
    update_json(session, &events)
}

fn select_alternative(
    session: &mut NavigationSession,
    route_json: &str,
    now: DateTime<Utc>,
) -> Result<String, BridgeError> {
    let route = route_from_json(route_json)?;
    let events = session.select_alternative(route, now)?;
    update_json(session, &events)
}

// --- JNI plumbing ---

fn read_string(env: &mut JNIEnv, value: &JString) -> Result<String, BridgeError> {
    Ok(env.get_string(value)?.into())
}

fn throw(env: &mut JNIEnv, error: &BridgeError) {
    log::warn!("native call failed: {error}");
    if let Err(e) = env.throw_new(error.exception_class(), error.to_string()) {
        log::error!("failed to throw Java exception: {e}");
    }
}

/// Return a JSON result to Java, or throw and return null.
fn respond(env: &mut JNIEnv, result: Result<String, BridgeError>) -> jstring {
    let result = result.and_then(|json| Ok(env.new_string(json)?));
    match result {
        Ok(s) => s.into_raw(),
        Err(e) => {
            throw(env, &e);
            std::ptr::null_mut()
        }
    }
}

/// # Safety
/// `handle` must be 0 or a value returned by `sessionCreate` that has not
/// been passed to `sessionDestroy`.
unsafe fn session_from_handle<'a>(handle: jlong) -> Result<&'a mut NavigationSession, BridgeError> {
    (handle as *mut NavigationSession).as_mut().ok_or(BridgeError::Handle)
}

/// Returns the rust-core library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_version(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    respond(&mut env, Ok(crate::VERSION.to_string()))
}

/// Routes `log` output to logcat. Safe to call more than once.
/// Maps to: RustBridge.initLogging()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_initLogging(_env: JNIEnv, _class: JClass) {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("navcore"),
    );
}

/// Maps to: RustBridge.decodePolyline(encoded: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_decodePolyline(
    mut env: JNIEnv,
    _class: JClass,
    encoded: JString,
) -> jstring {
    let result = read_string(&mut env, &encoded)
        .and_then(|s| Ok(polyline::decode_to_json(&s)?));
    respond(&mut env, result)
}

/// Service profile to request routes for. The host builds the request.
/// Maps to: RustBridge.routingProfile(mode: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_routingProfile(
    mut env: JNIEnv,
    _class: JClass,
    mode: JString,
) -> jstring {
    let result = read_string(&mut env, &mode)
        .and_then(|tag| transport_mode(&tag))
        .map(|mode| mode.profile().to_string());
    respond(&mut env, result)
}

/// Maps to: RustBridge.parseRoutes(responseJson: String, mode: String, locale: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_parseRoutes(
    mut env: JNIEnv,
    _class: JClass,
    response_json: JString,
    mode: JString,
    locale_tag: JString,
) -> jstring {
    let result = (|| {
        let json = read_string(&mut env, &response_json)?;
        let mode = transport_mode(&read_string(&mut env, &mode)?)?;
        let locale = locale(&read_string(&mut env, &locale_tag)?)?;
        routes_json(&parse_routes_json(&json, mode, locale)?)
    })();
    respond(&mut env, result)
}

/// Maps to: RustBridge.routesFromGpx(data: ByteArray, mode: String, locale: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_routesFromGpx(
    mut env: JNIEnv,
    _class: JClass,
    data: JByteArray,
    mode: JString,
    locale_tag: JString,
) -> jstring {
    let result = (|| {
        let bytes = env.convert_byte_array(&data)?;
        let mode = transport_mode(&read_string(&mut env, &mode)?)?;
        let locale = locale(&read_string(&mut env, &locale_tag)?)?;
        routes_json(&routes_from_gpx_bytes(&bytes, mode, locale)?)
    })();
    respond(&mut env, result)
}

/// Maps to: RustBridge.sessionCreate(configJson: String) -> Long
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_sessionCreate(
    mut env: JNIEnv,
    _class: JClass,
    config_json: JString,
) -> jlong {
    let result = read_string(&mut env, &config_json)
        .and_then(|json| Ok(NavigationConfig::from_json(&json)?));
    match result {
        Ok(config) => Box::into_raw(Box::new(NavigationSession::new(config))) as jlong,
        Err(e) => {
            throw(&mut env, &e);
            0
        }
    }
}

/// Maps to: RustBridge.sessionStart(handle: Long, routeJson: String, lat: Double, lon: Double, epochMs: Long) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_sessionStart(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    route_json: JString,
    lat: jdouble,
    lon: jdouble,
    epoch_ms: jlong,
) -> jstring {
    let result = (|| {
        let session = unsafe { session_from_handle(handle)? };
        let json = read_string(&mut env, &route_json)?;
        start_session(session, &json, location_fix(lat, lon, epoch_ms)?)
    })();
    respond(&mut env, result)
}

/// Maps to: RustBridge.sessionUpdate(handle: Long, lat: Double, lon: Double, epochMs: Long) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_sessionUpdate(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    lat: jdouble,
    lon: jdouble,
    epoch_ms: jlong,
) -> jstring {
    let result = (|| {
        let session = unsafe { session_from_handle(handle)? };
        update_session(session, location_fix(lat, lon, epoch_ms)?)
    })();
    respond(&mut env, result)
}

/// Maps to: RustBridge.sessionSelectAlternative(handle: Long, routeJson: String, epochMs: Long) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_sessionSelectAlternative(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    route_json: JString,
    epoch_ms: jlong,
) -> jstring {
    let result = (|| {
        let session = unsafe { session_from_handle(handle)? };
        let json = read_string(&mut env, &route_json)?;
        select_alternative(session, &json, timestamp(epoch_ms)?)
    })();
    respond(&mut env, result)
}

/// Maps to: RustBridge.sessionPause(handle: Long)
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_sessionPause(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    let result = unsafe { session_from_handle(handle) }
        .and_then(|session| Ok(session.pause()?));
    if let Err(e) = result {
        throw(&mut env, &e);
    }
}

fn resume_session(session: &mut NavigationSession) -> jboolean {
    if session.resume() {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Maps to: RustBridge.sessionResume(handle: Long) -> Boolean
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_sessionResume(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jboolean {
    match unsafe { session_from_handle(handle) } {
        Ok(session) => resume_session(session),
        Err(e) => {
            throw(&mut env, &e);
            JNI_FALSE
        }
    }
}

/// Maps to: RustBridge.sessionStop(handle: Long)
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_sessionStop(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    match unsafe { session_from_handle(handle) } {
        Ok(session) => session.stop(),
        Err(e) => throw(&mut env, &e),
    }
}

/// Releases a session. The handle must not be used afterwards.
/// Maps to: RustBridge.sessionDestroy(handle: Long)
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navcore_app_RustBridge_sessionDestroy(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if handle != 0 {
        drop(unsafe { Box::from_raw(handle as *mut NavigationSession) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::ManeuverKind;

    const RESPONSE: &str = r#"{"code": "Ok", "routes": [{
        "distance": 1000.0, "duration": 100.0, "geometry": "",
        "legs": [{"steps": [
            {"distance": 1000.0, "duration": 100.0, "name": "Main Street",
             "maneuver": {"location": [16.0, 48.0], "type": "depart"}},
            {"distance": 0.0, "duration": 0.0, "name": "Main Street",
             "maneuver": {"location": [16.0, 48.009], "type": "arrive"}}
        ]}]
    }]}"#;

    fn route_json() -> String {
        let routes = parse_routes_json(RESPONSE, TransportMode::Car, Locale::En).unwrap();
        serde_json::to_string(&routes[0]).unwrap()
    }

    #[test]
    fn parses_tags() {
        assert_eq!(transport_mode("bike").unwrap(), TransportMode::Cycling);
        assert!(transport_mode("rocket").is_err());
        assert_eq!(transport_mode("walking").unwrap().profile(), "foot");
        assert_eq!(transport_mode("transit").unwrap().profile(), "car");
        assert_eq!(locale("fr-CA").unwrap(), Locale::Fr);
        assert!(locale("xx").is_err());
    }

    #[test]
    fn rejects_bad_fix() {
        assert!(matches!(location_fix(91.0, 0.0, 0), Err(BridgeError::Data(_))));
        assert!(matches!(location_fix(0.0, 0.0, i64::MAX), Err(BridgeError::Timestamp(_))));
    }

    #[test]
    fn route_survives_json_crossing() {
        let route = route_from_json(&route_json()).unwrap();
        assert_eq!(route.steps().len(), 2);
        assert_eq!(route.steps()[1].maneuver, ManeuverKind::Arrive);
    }

    #[test]
    fn session_round_trip_through_json() {
        let mut session = NavigationSession::default();

        let json = start_session(&mut session, &route_json(), location_fix(48.0, 16.0, 0).unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["events"][0]["type"], "announce");
        assert_eq!(value["events"][0]["text"], "Head out on Main Street");
        assert_eq!(value["events"][0]["repeat"], false);
        assert_eq!(value["status"]["state"], "active");

        let json = update_session(&mut session, location_fix(48.0089, 16.0, 60_000).unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let types: Vec<&str> = value["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["step_advanced", "announce", "upcoming_turn", "arrived"]);
        assert_eq!(value["status"]["state"], "arrived");
    }

    #[test]
    fn resume_reports_whether_paused() {
        let mut session = NavigationSession::default();
        assert_eq!(resume_session(&mut session), JNI_FALSE);

        start_session(&mut session, &route_json(), location_fix(48.0, 16.0, 0).unwrap()).unwrap();
        session.pause().unwrap();
        assert_eq!(resume_session(&mut session), JNI_TRUE);
        assert_eq!(resume_session(&mut session), JNI_FALSE);
    }

    #[test]
    fn update_before_start_is_a_state_error() {
        let mut session = NavigationSession::default();
        let err = update_session(&mut session, location_fix(48.0, 16.0, 0).unwrap()).unwrap_err();
        assert_eq!(err.exception_class(), "java/lang/IllegalStateException");
    }

    #[test]
    fn alternative_through_json() {
        let mut session = NavigationSession::default();
        start_session(&mut session, &route_json(), location_fix(48.0, 16.0, 0).unwrap()).unwrap();
        let json = select_alternative(&mut session, &route_json(), timestamp(1_000).unwrap()).unwrap();
        assert!(json.contains("\"current_step\":0"));
    }

    #[test]
    fn null_handle_is_rejected() {
        assert!(matches!(unsafe { session_from_handle(0) }, Err(BridgeError::Handle)));
    }
}
