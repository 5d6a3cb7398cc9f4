//! Error types for the navigation core.
//!
//! `NavError` covers bad input data (polylines, routing responses, GPX,
//! coordinates). `TransitionError` is separate: it signals a session
//! operation called in a state where it is not allowed, which is a caller
//! bug rather than a data problem.

use thiserror::Error;

use crate::session::SessionState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    #[error("malformed polyline at byte {position}: {reason}")]
    MalformedPolyline { position: usize, reason: &'static str },

    #[error("malformed routing response: {0}")]
    MalformedResponse(String),

    #[error("route not found: {}", .message.as_deref().unwrap_or("no reason given"))]
    RouteNotFound { message: Option<String> },

    #[error("invalid coordinate: lat {latitude}, lon {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("GPX error: {0}")]
    Gpx(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for NavError {
    fn from(e: serde_json::Error) -> Self {
        NavError::Json(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;

/// A session operation was invoked from a state that does not accept it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot {operation} while session is {state:?}")]
pub struct TransitionError {
    pub operation: &'static str,
    pub state: SessionState,
}
