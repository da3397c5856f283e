//! Parse device telemetry text into a `Fix`.
//!
//! Wire form (one message): `Lat: <float>, Lng: <float>, Sats: <int>`
//!
//! - Three comma-separated `label: value` fields, fixed order
//! - Labels are case-sensitive; the separator is colon + single space
//! - Surrounding whitespace (including `\r\n`) is ignored

use crate::types::{Fix, ParseError};

const LAT_LABEL: &str = "Lat";
const LNG_LABEL: &str = "Lng";
const SATS_LABEL: &str = "Sats";

const FIELD_COUNT: usize = 3;

/// Parse one raw telemetry message.
pub fn parse(raw: &[u8]) -> Result<Fix, ParseError> {
    let text = std::str::from_utf8(raw).map_err(|_| ParseError::Encoding)?;
    parse_str(text)
}

/// Parse one telemetry message that is already text.
pub fn parse_str(text: &str) -> Result<Fix, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Malformed("empty message".into()));
    }

    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != FIELD_COUNT {
        return Err(ParseError::Malformed(format!(
            "expected {FIELD_COUNT} fields, got {}",
            parts.len()
        )));
    }

    let lat = field_value(parts[0], LAT_LABEL)?;
    let lng = field_value(parts[1], LNG_LABEL)?;
    let sats = field_value(parts[2], SATS_LABEL)?;

    Ok(Fix {
        latitude: parse_float(lat, LAT_LABEL)?,
        longitude: parse_float(lng, LNG_LABEL)?,
        satellite_count: sats.parse::<i64>().map_err(|e| {
            ParseError::Malformed(format!("invalid {SATS_LABEL} value '{sats}': {e}"))
        })?,
    })
}

/// Format a fix in the device's wire form (inverse of `parse`).
pub fn format_fix(fix: &Fix) -> String {
    format!(
        "{LAT_LABEL}: {}, {LNG_LABEL}: {}, {SATS_LABEL}: {}",
        fix.latitude, fix.longitude, fix.satellite_count
    )
}

/// Split `label: value` on the first `": "` and check the label.
fn field_value<'a>(segment: &'a str, label: &str) -> Result<&'a str, ParseError> {
    let (key, value) = segment.split_once(": ").ok_or_else(|| {
        ParseError::Malformed(format!("missing ': ' separator in '{segment}'"))
    })?;

    if key != label {
        return Err(ParseError::Malformed(format!(
            "expected label '{label}', got '{key}'"
        )));
    }

    Ok(value.trim())
}

// NaN and infinities would serialize as JSON null.
fn parse_float(value: &str, label: &str) -> Result<f64, ParseError> {
    let parsed = value
        .parse::<f64>()
        .map_err(|e| ParseError::Malformed(format!("invalid {label} value '{value}': {e}")))?;
    if !parsed.is_finite() {
        return Err(ParseError::Malformed(format!(
            "non-finite {label} value '{value}'"
        )));
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed(raw: &[u8]) -> bool {
        matches!(parse(raw), Err(ParseError::Malformed(_)))
    }

    #[test]
    fn test_parse_valid() {
        let fix = parse(b"Lat: 37.422, Lng: -122.084, Sats: 8").unwrap();
        assert_eq!(fix.latitude, 37.422);
        assert_eq!(fix.longitude, -122.084);
        assert_eq!(fix.satellite_count, 8);
    }

    #[test]
    fn test_parse_surrounding_whitespace() {
        let fix = parse(b"  Lat: 1.5, Lng: 2.5, Sats: 3\r\n").unwrap();
        assert_eq!(fix, Fix::new(1.5, 2.5, 3));
    }

    #[test]
    fn test_parse_integer_coordinates() {
        let fix = parse(b"Lat: 0, Lng: 0, Sats: 0").unwrap();
        assert_eq!(fix, Fix::zero());
    }

    #[test]
    fn test_parse_negative_sats_passes_through() {
        let fix = parse(b"Lat: 10.0, Lng: 20.0, Sats: -1").unwrap();
        assert_eq!(fix.satellite_count, -1);
    }

    #[test]
    fn test_parse_out_of_range_coordinates_accepted() {
        let fix = parse(b"Lat: 123.0, Lng: -500.25, Sats: 4").unwrap();
        assert_eq!(fix.latitude, 123.0);
        assert_eq!(fix.longitude, -500.25);
    }

    #[test]
    fn test_parse_invalid_utf8() {
        assert_eq!(parse(&[0xFF, 0xFE, 0x00]), Err(ParseError::Encoding));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(malformed(b"garbage"));
        assert!(malformed(b""));
        assert!(malformed(b"   \n"));
    }

    #[test]
    fn test_parse_missing_field() {
        assert!(malformed(b"Lat: 37.422, Lng: -122.084"));
        assert!(malformed(b"Lat: 37.422, Lng: -122.084, Sats:"));
        assert!(malformed(b"Lat: 37.422, Lng: -122.084, Sats: "));
    }

    #[test]
    fn test_parse_extra_field() {
        assert!(malformed(b"Lat: 37.422, Lng: -122.084, Sats: 8, Alt: 10"));
        assert!(malformed(b"Lat: 37.422,, Lng: -122.084, Sats: 8"));
    }

    #[test]
    fn test_parse_non_numeric() {
        assert!(malformed(b"Lat: abc, Lng: -122.084, Sats: 8"));
        assert!(malformed(b"Lat: 37.422, Lng: west, Sats: 8"));
        assert!(malformed(b"Lat: 37.422, Lng: -122.084, Sats: 8.5"));
    }

    #[test]
    fn test_parse_non_finite_rejected() {
        assert!(malformed(b"Lat: NaN, Lng: -122.084, Sats: 3"));
        assert!(malformed(b"Lat: 37.422, Lng: inf, Sats: 3"));
        assert!(malformed(b"Lat: -infinity, Lng: 1.0, Sats: 3"));
        assert!(malformed(b"Lat: 1e999, Lng: 1.0, Sats: 3"));
    }

    #[test]
    fn test_parse_label_case_sensitive() {
        assert!(malformed(b"lat: 37.422, Lng: -122.084, Sats: 8"));
        assert!(malformed(b"Lat: 37.422, LNG: -122.084, Sats: 8"));
    }

    #[test]
    fn test_parse_field_order_fixed() {
        assert!(malformed(b"Lng: -122.084, Lat: 37.422, Sats: 8"));
    }

    #[test]
    fn test_parse_requires_space_after_colon() {
        assert!(malformed(b"Lat:37.422, Lng: -122.084, Sats: 8"));
    }

    #[test]
    fn test_malformed_message_names_the_problem() {
        match parse(b"Lat: 37.422, Lng: -122.084") {
            Err(ParseError::Malformed(msg)) => assert!(msg.contains("expected 3 fields")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_format_roundtrip() {
        let fixes = [
            Fix::new(37.422, -122.084, 8),
            Fix::new(-33.8688, 151.2093, 12),
            Fix::new(0.000001, -0.5, 0),
            Fix::new(51.5, 0.1275, -3),
        ];
        for fix in fixes {
            let text = format_fix(&fix);
            assert_eq!(parse(text.as_bytes()).unwrap(), fix, "text: {text}");
        }
    }

    #[test]
    fn test_format_wire_form() {
        assert_eq!(
            format_fix(&Fix::new(37.422, -122.084, 8)),
            "Lat: 37.422, Lng: -122.084, Sats: 8"
        );
    }
}
