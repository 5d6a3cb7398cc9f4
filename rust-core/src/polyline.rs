//! Encoded polyline format (precision 5).
//!
//! Each coordinate is stored as the signed delta from the previous one,
//! scaled by 1e5, zig-zag encoded and packed into 5-bit groups, least
//! significant first. Every group except the last carries the 0x20
//! continuation bit, and each byte is offset by 63 to land in printable
//! ASCII. Latitude and longitude deltas alternate.

use crate::error::{NavError, Result};
use crate::geo::Coordinate;

const PRECISION: f64 = 1e5;
const OFFSET: u8 = 63;
const CONTINUATION: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
/// Largest byte the scheme can produce: 63 + (0x20 | 0x1f).
const MAX_BYTE: u8 = OFFSET + 0x3f;
/// Values are bounded by 180e5 which fits in 7 groups; anything longer is garbage.
const MAX_SHIFT: u32 = 35;

/// Decode a polyline string into coordinates.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat += decode_value(bytes, &mut index)?;
        if index >= bytes.len() {
            return Err(NavError::MalformedPolyline {
                position: index,
                reason: "latitude without longitude",
            });
        }
        lon += decode_value(bytes, &mut index)?;

        coordinates.push(Coordinate::new(lat as f64 / PRECISION, lon as f64 / PRECISION)?);
    }

    Ok(coordinates)
}

/// Read one zig-zag encoded value starting at `index`, advancing it past
/// the value's last byte.
fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(NavError::MalformedPolyline {
                position: *index,
                reason: "unterminated value",
            });
        };
        if !(OFFSET..=MAX_BYTE).contains(&byte) {
            return Err(NavError::MalformedPolyline {
                position: *index,
                reason: "byte outside encoding range",
            });
        }
        if shift > MAX_SHIFT {
            return Err(NavError::MalformedPolyline {
                position: *index,
                reason: "value too long",
            });
        }
        *index += 1;

        let chunk = i64::from(byte - OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk < CONTINUATION {
            break;
        }
    }

    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

/// Encode coordinates into a polyline string.
pub fn encode(coordinates: &[Coordinate]) -> String {
    let mut out = String::with_capacity(coordinates.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for c in coordinates {
        // Deltas are taken between rounded values so error never accumulates
        let lat = (c.lat() * PRECISION).round() as i64;
        let lon = (c.lon() * PRECISION).round() as i64;

        encode_value(lat - prev_lat, &mut out);
        encode_value(lon - prev_lon, &mut out);

        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };

    while v >= CONTINUATION {
        out.push(char::from(((CONTINUATION | (v & CHUNK_MASK)) as u8) + OFFSET));
        v >>= 5;
    }
    out.push(char::from((v as u8) + OFFSET));
}

/// Decode a polyline and return the coordinates as a JSON array.
pub fn decode_to_json(encoded: &str) -> Result<String> {
    let coordinates = decode(encoded)?;
    Ok(serde_json::to_string(&coordinates)?)
}
