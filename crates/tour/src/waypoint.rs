use std::path::Path;

use foundation::math::LatLng;
use serde::{Deserialize, Serialize};

use crate::error::TourError;

/// A dataset record as produced by the map exporter.
///
/// `year` may be a string, an integer, or absent/null; it is normalized to a
/// string so timeline entries and lookups compare the same representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWaypoint {
    pub name: String,
    #[serde(default, deserialize_with = "de_year")]
    pub year: Option<String>,
    /// `[lat, lon]` in degrees.
    pub location: [f64; 2],
}

impl RawWaypoint {
    pub fn new(name: impl Into<String>, year: Option<&str>, location: [f64; 2]) -> Self {
        Self {
            name: name.into(),
            year: year.map(str::to_string),
            location,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearRepr {
    Text(String),
    Number(i64),
}

fn de_year<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let repr = Option::<YearRepr>::deserialize(deserializer)?;
    Ok(repr.and_then(|r| match r {
        YearRepr::Text(s) if s.trim().is_empty() => None,
        YearRepr::Text(s) => Some(s),
        YearRepr::Number(n) => Some(n.to_string()),
    }))
}

/// A named, geolocated, optionally year-tagged point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub year: Option<String>,
    pub location: LatLng,
}

impl Waypoint {
    /// Numeric year used for ordering, if the label has one.
    pub fn year_value(&self) -> Option<i64> {
        self.year.as_deref().and_then(parse_year)
    }
}

impl From<&RawWaypoint> for Waypoint {
    fn from(raw: &RawWaypoint) -> Self {
        Self {
            name: raw.name.clone(),
            year: raw.year.clone(),
            location: LatLng::from(raw.location),
        }
    }
}

/// Parses the leading integer of a year label (`"1926"`, `" 1926年 "`).
pub fn parse_year(label: &str) -> Option<i64> {
    let s = label.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

pub fn parse_dataset(json: &str) -> Result<Vec<RawWaypoint>, TourError> {
    serde_json::from_str(json).map_err(|e| TourError::Dataset(e.to_string()))
}

pub fn load_dataset(path: &Path) -> Result<Vec<RawWaypoint>, TourError> {
    let text = std::fs::read_to_string(path)?;
    parse_dataset(&text)
}

#[cfg(test)]
mod tests {
    use super::{RawWaypoint, Waypoint, parse_dataset, parse_year};
    use crate::error::TourError;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_leading_integer() {
        assert_eq!(parse_year("1926"), Some(1926));
        assert_eq!(parse_year(" 1926年"), Some(1926));
        assert_eq!(parse_year("-300"), Some(-300));
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn dataset_accepts_string_number_and_null_years() {
        let raw = parse_dataset(
            r#"[
                {"name": "A", "year": "1900", "location": [28.1, 112.9]},
                {"name": "B", "year": 1950, "location": [28.2, 112.9]},
                {"name": "C", "year": null, "location": [28.3, 112.9]},
                {"name": "D", "location": [28.4, 112.9]}
            ]"#,
        )
        .unwrap();

        let years: Vec<_> = raw.iter().map(|r| r.year.clone()).collect();
        assert_eq!(
            years,
            vec![Some("1900".to_string()), Some("1950".to_string()), None, None]
        );
    }

    #[test]
    fn dataset_rejects_missing_location() {
        let err = parse_dataset(r#"[{"name": "A", "year": "1900"}]"#).unwrap_err();
        assert!(matches!(err, TourError::Dataset(_)));
    }

    #[test]
    fn waypoint_from_raw() {
        let wp = Waypoint::from(&RawWaypoint::new("A", Some("1900"), [28.1, 112.9]));
        assert_eq!(wp.location.lat, 28.1);
        assert_eq!(wp.year_value(), Some(1900));
    }
}
