//! Live navigation along a route.
//!
//! A `NavigationSession` consumes position fixes one at a time, moves
//! forward through the route's steps and reports what should be spoken or
//! shown as `NavEvent` values. It never performs I/O, never reads the
//! clock (times come from the fixes) and never calls back into the host.
//!
//! State machine:
//!
//! ```text
//! Idle/Stopped --start--> Active <--pause/resume--> Paused
//!                           |
//!                           +-- final maneuver reached --> Arrived
//! any state --stop--> Stopped
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::NavigationConfig;
use crate::error::TransitionError;
use crate::format::{format_clock_time, format_distance, format_duration};
use crate::geo::{distance, Coordinate};
use crate::instruction;
use crate::route::{Route, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Active,
    Paused,
    Arrived,
    Stopped,
}

/// A position report from the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self { coordinate, timestamp }
    }
}

/// Output of the session, in the order things happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavEvent {
    /// The current step moved forward to `index`.
    StepAdvanced { index: usize },
    /// Instruction to speak/display for the step just entered. `repeat`
    /// is set when the text equals the one spoken last, so a speech layer
    /// can stay quiet.
    Announce { text: String, repeat: bool },
    /// Warning ahead of the current maneuver.
    UpcomingTurn { text: String, distance_m: f64 },
    /// The destination was reached; the session is finished.
    Arrived,
}

/// Snapshot of the derived metrics, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub current_step: usize,
    pub step_count: usize,
    pub progress: f64,
    pub remaining_distance_m: f64,
    pub remaining_duration_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_to_next_maneuver_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<DateTime<Utc>>,
    pub remaining_distance_text: String,
    pub remaining_duration_text: String,
    pub arrival_time_text: String,
}

#[derive(Debug, Clone)]
pub struct NavigationSession {
    config: NavigationConfig,
    state: SessionState,
    route: Option<Route>,
    current_step: usize,
    /// Steps whose entry announcement has fired.
    announced: HashSet<usize>,
    /// Steps whose upcoming-turn warning has fired.
    pre_announced: HashSet<usize>,
    last_spoken: Option<String>,
    distance_to_next_m: Option<f64>,
    remaining_distance_m: f64,
    remaining_duration_s: f64,
    eta: Option<DateTime<Utc>>,
    trip_started_at: Option<DateTime<Utc>>,
    last_fix_at: Option<DateTime<Utc>>,
}

impl Default for NavigationSession {
    fn default() -> Self {
        Self::new(NavigationConfig::default())
    }
}

impl NavigationSession {
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            route: None,
            current_step: 0,
            announced: HashSet::new(),
            pre_announced: HashSet::new(),
            last_spoken: None,
            distance_to_next_m: None,
            remaining_distance_m: 0.0,
            remaining_duration_s: 0.0,
            eta: None,
            trip_started_at: None,
            last_fix_at: None,
        }
    }

    /// Begin navigating `route` from `fix`. Announces the first step.
    pub fn start(&mut self, route: Route, fix: LocationFix) -> Result<Vec<NavEvent>, TransitionError> {
        self.require(&[SessionState::Idle, SessionState::Stopped], "start")?;

        log::info!(
            "starting navigation: {} steps, {:.0} m",
            route.steps().len(),
            route.distance_m()
        );

        self.clear_progress();
        self.last_spoken = None;
        self.trip_started_at = Some(fix.timestamp);
        self.last_fix_at = Some(fix.timestamp);
        self.distance_to_next_m = Some(distance(&fix.coordinate, &route.steps()[0].coordinate));
        self.route = Some(route);
        self.state = SessionState::Active;
        self.refresh_remaining(fix.timestamp);

        Ok(self.announce_first_step())
    }

    /// Suspend tracking. The route and all progress are kept.
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.require(&[SessionState::Active], "pause")?;
        self.state = SessionState::Paused;
        log::debug!("navigation paused at step {}", self.current_step);
        Ok(())
    }

    /// Resume a paused session. Returns false, changing nothing, when
    /// there is no paused route to resume.
    pub fn resume(&mut self) -> bool {
        if self.state == SessionState::Paused && self.route.is_some() {
            self.state = SessionState::Active;
            log::debug!("navigation resumed at step {}", self.current_step);
            true
        } else {
            false
        }
    }

    /// End the session from any state, dropping the route and all bookkeeping.
    pub fn stop(&mut self) {
        if self.state != SessionState::Stopped {
            log::info!("navigation stopped in state {:?}", self.state);
        }
        self.route = None;
        self.clear_progress();
        self.last_spoken = None;
        self.distance_to_next_m = None;
        self.remaining_distance_m = 0.0;
        self.remaining_duration_s = 0.0;
        self.eta = None;
        self.trip_started_at = None;
        self.last_fix_at = None;
        self.state = SessionState::Stopped;
    }

    /// Swap in an alternative route for the same trip.
    ///
    /// Progress restarts at the first step of the new route and its
    /// announcements start over, but the trip start time is kept.
    pub fn select_alternative(
        &mut self,
        route: Route,
        now: DateTime<Utc>,
    ) -> Result<Vec<NavEvent>, TransitionError> {
        self.require(&[SessionState::Active, SessionState::Paused], "select alternative")?;

        log::info!("switching to alternative route: {} steps", route.steps().len());
        self.clear_progress();
        self.last_spoken = None;
        self.distance_to_next_m = None;
        self.route = Some(route);
        self.refresh_remaining(now);

        Ok(self.announce_first_step())
    }

    /// Feed one position fix. Only valid while `Active`.
    ///
    /// Fixes older than the previous one are ignored.
    pub fn on_location_update(&mut self, fix: LocationFix) -> Result<Vec<NavEvent>, TransitionError> {
        self.require(&[SessionState::Active], "update location")?;

        if self.last_fix_at.is_some_and(|last| fix.timestamp < last) {
            log::debug!("ignoring out-of-order fix at {}", fix.timestamp);
            return Ok(Vec::new());
        }
        self.last_fix_at = Some(fix.timestamp);

        let Some(route) = self.route.as_ref() else {
            return Err(self.transition_error("update location"));
        };
        let steps = route.steps();
        let position = fix.coordinate;
        let mut events = Vec::new();

        // Search only forward, so GPS noise near an earlier maneuver never rewinds progress
        let closest = closest_step(steps, self.current_step, &position);
        if closest > self.current_step {
            log::debug!("advancing from step {} to {closest}", self.current_step);
            self.current_step = closest;
            let (remaining_m, remaining_s) = route.remaining_from(closest);
            self.remaining_distance_m = remaining_m;
            self.remaining_duration_s = remaining_s;
            self.eta = eta_after(fix.timestamp, remaining_s);

            events.push(NavEvent::StepAdvanced { index: closest });
            if self.announced.insert(closest) {
                events.push(announce(&mut self.last_spoken, &steps[closest].instruction));
            }
        }

        let step = &steps[self.current_step];
        let to_maneuver = distance(&position, &step.coordinate);
        self.distance_to_next_m = Some(to_maneuver);

        if to_maneuver < self.config.upcoming_turn_threshold_m
            && self.pre_announced.insert(self.current_step)
        {
            let text = instruction::upcoming(to_maneuver, &step.instruction, self.config.locale);
            self.last_spoken = Some(text.clone());
            events.push(NavEvent::UpcomingTurn {
                text,
                distance_m: to_maneuver,
            });
        }

        if self.current_step == route.last_step_index()
            && to_maneuver < self.config.arrival_threshold_m
        {
            log::info!("arrived, {:.0} m from destination", to_maneuver);
            events.push(NavEvent::Arrived);
            self.state = SessionState::Arrived;
        }

        Ok(events)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.route.as_ref()?.steps().get(self.current_step)
    }

    pub fn next_step(&self) -> Option<&Step> {
        self.route.as_ref()?.steps().get(self.current_step + 1)
    }

    /// Distance from the last fix to the current step's maneuver.
    pub fn distance_to_next_maneuver_m(&self) -> Option<f64> {
        self.distance_to_next_m
    }

    pub fn remaining_distance_m(&self) -> f64 {
        self.remaining_distance_m
    }

    pub fn remaining_duration_s(&self) -> f64 {
        self.remaining_duration_s
    }

    pub fn eta(&self) -> Option<DateTime<Utc>> {
        self.eta
    }

    /// Time since the trip started. Survives route swaps.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.trip_started_at.map(|start| now - start)
    }

    /// Fraction of steps already passed, in [0, 1).
    pub fn progress(&self) -> f64 {
        match &self.route {
            Some(route) => self.current_step as f64 / route.steps().len() as f64,
            None => 0.0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            current_step: self.current_step,
            step_count: self.route.as_ref().map_or(0, |r| r.steps().len()),
            progress: self.progress(),
            remaining_distance_m: self.remaining_distance_m,
            remaining_duration_s: self.remaining_duration_s,
            distance_to_next_maneuver_m: self.distance_to_next_m,
            eta: self.eta,
            remaining_distance_text: format_distance(self.remaining_distance_m),
            remaining_duration_text: format_duration(self.remaining_duration_s),
            arrival_time_text: format_clock_time(self.eta),
        }
    }

    fn require(&self, allowed: &[SessionState], operation: &'static str) -> Result<(), TransitionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.transition_error(operation))
        }
    }

    fn transition_error(&self, operation: &'static str) -> TransitionError {
        TransitionError {
            operation,
            state: self.state,
        }
    }

    fn clear_progress(&mut self) {
        self.current_step = 0;
        self.announced.clear();
        self.pre_announced.clear();
    }

    fn refresh_remaining(&mut self, now: DateTime<Utc>) {
        let (meters, seconds) = self
            .route
            .as_ref()
            .map_or((0.0, 0.0), |r| r.remaining_from(self.current_step));
        self.remaining_distance_m = meters;
        self.remaining_duration_s = seconds;
        self.eta = self.route.as_ref().and_then(|_| eta_after(now, seconds));
    }

    fn announce_first_step(&mut self) -> Vec<NavEvent> {
        let Some(first) = self.route.as_ref().and_then(|r| r.steps().first()) else {
            return Vec::new();
        };
        self.announced.insert(0);
        vec![announce(&mut self.last_spoken, &first.instruction)]
    }
}

/// Index of the step at or after `from` whose maneuver is nearest to
/// `position`. Ties go to the earlier step.
fn closest_step(steps: &[Step], from: usize, position: &Coordinate) -> usize {
    let mut best = from;
    let mut best_distance = f64::INFINITY;

    for (i, step) in steps.iter().enumerate().skip(from) {
        let d = distance(position, &step.coordinate);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }

    best
}

fn eta_after(now: DateTime<Utc>, seconds: f64) -> Option<DateTime<Utc>> {
    let millis = (seconds * 1000.0).round() as i64;
    now.checked_add_signed(Duration::milliseconds(millis))
}

/// Announce `text`, flagged as a repeat when it equals the text spoken last.
fn announce(last_spoken: &mut Option<String>, text: &str) -> NavEvent {
    let repeat = last_spoken.as_deref() == Some(text);
    if repeat {
        log::debug!("repeated announcement {text:?}");
    } else {
        *last_spoken = Some(text.to_string());
    }
    NavEvent::Announce {
        text: text.to_string(),
        repeat,
    }
}
