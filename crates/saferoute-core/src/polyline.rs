//! Encoded polyline codec (signed varint, 1e-5 precision).
//!
//! Encoded strings carry `lat, lon` deltas; decoded output is `[lon, lat]`
//! to match every other geometry in the engine.

use thiserror::Error;

const PRECISION: f64 = 1e5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("invalid polyline character at byte {0}")]
    InvalidChar(usize),
    #[error("polyline ends mid-value")]
    Truncated,
    #[error("polyline value overflows at byte {0}")]
    Overflow(usize),
}

/// Decode an encoded polyline into `[lon, lat]` pairs.
pub fn decode(encoded: &str) -> Result<Vec<[f64; 2]>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0usize;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;
    let mut points = Vec::with_capacity(bytes.len() / 4);

    while index < bytes.len() {
        let dlat = next_value(bytes, &mut index)?;
        lat = lat.checked_add(dlat).ok_or(PolylineError::Overflow(index))?;
        if index >= bytes.len() {
            return Err(PolylineError::Truncated);
        }
        let dlon = next_value(bytes, &mut index)?;
        lon = lon.checked_add(dlon).ok_or(PolylineError::Overflow(index))?;
        points.push([lon as f64 / PRECISION, lat as f64 / PRECISION]);
    }

    Ok(points)
}

/// Decode, degrading to an empty geometry on corrupt input.
pub fn decode_or_empty(encoded: &str) -> Vec<[f64; 2]> {
    match decode(encoded) {
        Ok(points) => points,
        Err(err) => {
            tracing::warn!("Discarding corrupt polyline geometry: {}", err);
            Vec::new()
        }
    }
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::Truncated);
        };
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidChar(*index));
        }
        if shift > 60 {
            return Err(PolylineError::Overflow(*index));
        }
        *index += 1;
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference string from the polyline algorithm documentation.
    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    // Inverse of `decode`, used to build fixtures.
    fn encode(points: &[[f64; 2]]) -> String {
        let mut out = String::with_capacity(points.len() * 8);
        let mut prev_lat: i64 = 0;
        let mut prev_lon: i64 = 0;
        for point in points {
            let lat = (point[1] * PRECISION).round() as i64;
            let lon = (point[0] * PRECISION).round() as i64;
            push_value(&mut out, lat - prev_lat);
            push_value(&mut out, lon - prev_lon);
            prev_lat = lat;
            prev_lon = lon;
        }
        out
    }

    fn push_value(out: &mut String, value: i64) {
        let mut v = if value < 0 { !(value << 1) } else { value << 1 };
        while v >= 0x20 {
            out.push(char::from((0x20 | (v & 0x1f)) as u8 + 63));
            v >>= 5;
        }
        out.push(char::from(v as u8 + 63));
    }

    #[test]
    fn decodes_reference_polyline_as_lon_lat() {
        let points = decode(REFERENCE).unwrap();
        assert_eq!(
            points,
            vec![[-120.2, 38.5], [-120.95, 40.7], [-126.453, 43.252]]
        );
    }

    #[test]
    fn encodes_reference_polyline() {
        let points = vec![[-120.2, 38.5], [-120.95, 40.7], [-126.453, 43.252]];
        assert_eq!(encode(&points), REFERENCE);
    }

    #[test]
    fn empty_string_decodes_to_empty_geometry() {
        assert_eq!(decode("").unwrap(), Vec::<[f64; 2]>::new());
    }

    #[test]
    fn corrupt_input_is_reported() {
        assert_eq!(decode("_p~iF~ps|"), Err(PolylineError::Truncated));
        assert_eq!(decode("_p~iF"), Err(PolylineError::Truncated));
        assert_eq!(decode("_p~i F~ps|U"), Err(PolylineError::InvalidChar(4)));
        assert!(decode_or_empty("_p~i\u{7f}").is_empty());
    }
}
