//! Turn-by-turn instruction text.
//!
//! Maps a maneuver (kind, modifier, road name, distance) to a sentence in
//! the requested locale. The mapping is total: every combination yields a
//! non-empty string, unknown modifiers fall back to "continue".

use serde::{Deserialize, Serialize};

use crate::format::format_distance;
use crate::route::ManeuverKind;

/// Language used for generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    pub fn parse(tag: &str) -> Option<Self> {
        let lang = tag.split(['-', '_']).next()?.to_ascii_lowercase();
        match lang.as_str() {
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            _ => None,
        }
    }

    fn generic_road(&self) -> &'static str {
        match self {
            Locale::En => "the road",
            Locale::Fr => "la route",
        }
    }
}

/// Side-dependent direction extracted from a modifier string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
    SharpLeft,
    SharpRight,
    SlightLeft,
    SlightRight,
    UTurn,
    Other,
}

impl Direction {
    fn parse(modifier: Option<&str>) -> Self {
        let Some(m) = modifier else {
            return Direction::Other;
        };
        match m.trim().to_ascii_lowercase().as_str() {
            "left" => Direction::Left,
            "right" => Direction::Right,
            "sharp left" => Direction::SharpLeft,
            "sharp right" => Direction::SharpRight,
            "slight left" => Direction::SlightLeft,
            "slight right" => Direction::SlightRight,
            "uturn" => Direction::UTurn,
            _ => Direction::Other,
        }
    }
}

/// Build the instruction for one maneuver.
pub fn instruction(
    kind: ManeuverKind,
    modifier: Option<&str>,
    road_name: Option<&str>,
    distance_m: f64,
    locale: Locale,
) -> String {
    let road = road_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(locale.generic_road());
    let direction = Direction::parse(modifier);

    use Direction::*;
    use ManeuverKind as K;

    match (locale, kind) {
        (Locale::En, K::Depart) => format!("Head out on {road}"),
        (Locale::Fr, K::Depart) => format!("Depart sur {road}"),

        (Locale::En, K::Arrive) => "You have arrived at your destination".to_string(),
        (Locale::Fr, K::Arrive) => "Vous etes arrive a destination".to_string(),

        (Locale::En, K::Turn) => match direction {
            Left => format!("Turn left onto {road}"),
            Right => format!("Turn right onto {road}"),
            SharpLeft => format!("Turn sharp left onto {road}"),
            SharpRight => format!("Turn sharp right onto {road}"),
            SlightLeft => format!("Turn slightly left onto {road}"),
            SlightRight => format!("Turn slightly right onto {road}"),
            UTurn => "Make a U-turn".to_string(),
            Other => continue_on(road, distance_m, locale),
        },
        (Locale::Fr, K::Turn) => match direction {
            Left => format!("Tournez a gauche sur {road}"),
            Right => format!("Tournez a droite sur {road}"),
            SharpLeft => format!("Tournez fortement a gauche sur {road}"),
            SharpRight => format!("Tournez fortement a droite sur {road}"),
            SlightLeft => format!("Tournez legerement a gauche sur {road}"),
            SlightRight => format!("Tournez legerement a droite sur {road}"),
            UTurn => "Faites demi-tour".to_string(),
            Other => continue_on(road, distance_m, locale),
        },

        (Locale::En, K::EndOfRoad) => match direction {
            Left => "At the end of the road, turn left".to_string(),
            Right => "At the end of the road, turn right".to_string(),
            _ => "End of the road".to_string(),
        },
        (Locale::Fr, K::EndOfRoad) => match direction {
            Left => "Au bout de la route, tournez a gauche".to_string(),
            Right => "Au bout de la route, tournez a droite".to_string(),
            _ => "Fin de route".to_string(),
        },

        (Locale::En, K::Fork) => match direction {
            Left => format!("Keep left onto {road}"),
            Right => format!("Keep right onto {road}"),
            _ => continue_on(road, distance_m, locale),
        },
        (Locale::Fr, K::Fork) => match direction {
            Left => format!("Tenez la gauche sur {road}"),
            Right => format!("Tenez la droite sur {road}"),
            _ => continue_on(road, distance_m, locale),
        },

        (Locale::En, K::Merge) => format!("Merge onto {road}"),
        (Locale::Fr, K::Merge) => format!("Rejoignez {road}"),

        (Locale::En, K::OnRamp) => format!("Take the ramp onto {road}"),
        (Locale::Fr, K::OnRamp) => format!("Prenez la bretelle vers {road}"),

        (Locale::En, K::OffRamp) => format!("Take the exit toward {road}"),
        (Locale::Fr, K::OffRamp) => format!("Sortez vers {road}"),

        (Locale::En, K::Roundabout | K::Rotary) => format!("Enter the roundabout toward {road}"),
        (Locale::Fr, K::Roundabout | K::Rotary) => format!("Entrez dans le rond-point vers {road}"),

        (Locale::En, K::ExitRoundabout) => format!("Exit the roundabout onto {road}"),
        (Locale::Fr, K::ExitRoundabout) => format!("Sortez du rond-point sur {road}"),

        (_, K::Continue | K::NewName | K::Notification) => continue_on(road, distance_m, locale),
    }
}

fn continue_on(road: &str, distance_m: f64, locale: Locale) -> String {
    let with_distance = distance_m.is_finite() && distance_m >= 1.0;
    match (locale, with_distance) {
        (Locale::En, true) => format!("Continue on {road} for {}", format_distance(distance_m)),
        (Locale::En, false) => format!("Continue on {road}"),
        (Locale::Fr, true) => format!("Continuez sur {road} pendant {}", format_distance(distance_m)),
        (Locale::Fr, false) => format!("Continuez sur {road}"),
    }
}

/// Warning spoken ahead of a maneuver, e.g. "In 80 m, turn left onto Main Street".
pub fn upcoming(distance_m: f64, instruction: &str, locale: Locale) -> String {
    let lead = match locale {
        Locale::En => "In",
        Locale::Fr => "Dans",
    };
    format!("{lead} {}, {}", format_distance(distance_m), lower_first(instruction))
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
