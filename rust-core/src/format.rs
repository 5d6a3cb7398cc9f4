//! Human-readable distance, duration and time strings.

use chrono::{DateTime, Utc};

/// "2.5 km" from 1 km up, otherwise meters rounded to the nearest 10.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", (meters / 10.0).round() as i64 * 10)
    }
}

/// "1h 5min", "12 min" or "< 1 min".
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;

    if hours > 0 {
        format!("{hours}h {minutes}min")
    } else if minutes > 0 {
        format!("{minutes} min")
    } else {
        "< 1 min".to_string()
    }
}

/// Wall-clock "HH:MM" in UTC, or "--:--" when unknown.
pub fn format_clock_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(t) => t.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_distance_meters() {
        assert_eq!(format_distance(150.0), "150 m");
        assert_eq!(format_distance(5.0), "10 m");
        assert_eq!(format_distance(0.0), "0 m");
    }

    #[test]
    fn format_distance_km() {
        assert_eq!(format_distance(2500.0), "2.5 km");
        assert_eq!(format_distance(1000.0), "1.0 km");
    }

    #[test]
    fn format_duration_ranges() {
        assert_eq!(format_duration(30.0), "< 1 min");
        assert_eq!(format_duration(12.0 * 60.0 + 5.0), "12 min");
        assert_eq!(format_duration(3600.0 + 5.0 * 60.0), "1h 5min");
        assert_eq!(format_duration(-4.0), "< 1 min");
    }

    #[test]
    fn format_clock() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 7, 3, 59).unwrap();
        assert_eq!(format_clock_time(Some(t)), "07:03");
        assert_eq!(format_clock_time(None), "--:--");
    }
}
