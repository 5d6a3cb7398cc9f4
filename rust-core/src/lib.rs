//! Turn-by-turn navigation core.
//!
//! Turns a routing-service response (or a GPX file) into a `Route`, then
//! follows the traveller along it with a `NavigationSession` that emits
//! announcement and arrival events. No I/O, no threads, no clock: the host
//! feeds position fixes and renders or speaks the events.

pub mod android_jni;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod geo;
pub mod gpx;
pub mod instruction;
pub mod polyline;
pub mod response;
pub mod route;
pub mod session;

pub use config::NavigationConfig;
pub use error::{NavError, Result, TransitionError};
pub use geo::Coordinate;
pub use instruction::Locale;
pub use route::{ManeuverKind, Route, Step, TransportMode};
pub use session::{LocationFix, NavEvent, NavigationSession, SessionState};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
