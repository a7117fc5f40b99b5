//! Markers and fixed-precision geographic coordinates.
//!
//! # Invariants
//! - Coordinates carry exactly 6 fractional digits; parsing never goes
//!   through floating point.
//! - Latitude stays within [-90, 90], longitude within [-180, 180].

use super::map::MapId;
use super::patch::{nullable, present};
use super::{normalize_optional, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type MarkerId = Uuid;

const SCALE: i64 = 1_000_000;
const SCALE_DIGITS: usize = 6;
const MAX_LATITUDE_E6: i64 = 90 * SCALE;
const MAX_LONGITUDE_E6: i64 = 180 * SCALE;

/// One decimal degree value stored as integer micro-degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "String")]
pub struct Coordinate {
    micro_degrees: i64,
}

/// Wire forms accepted for a coordinate: decimal text or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    pub const fn from_micro_degrees(micro_degrees: i64) -> Self {
        Self { micro_degrees }
    }

    /// Rounds a float to the nearest micro-degree.
    pub fn from_degrees(degrees: f64) -> Result<Self, ValidationError> {
        if !degrees.is_finite() || degrees.abs() > 360.0 {
            return Err(ValidationError::InvalidCoordinate(degrees.to_string()));
        }
        Ok(Self {
            micro_degrees: (degrees * SCALE as f64).round() as i64,
        })
    }

    pub const fn micro_degrees(self) -> i64 {
        self.micro_degrees
    }

    pub fn to_degrees(self) -> f64 {
        self.micro_degrees as f64 / SCALE as f64
    }
}

impl FromStr for Coordinate {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || ValidationError::InvalidCoordinate(trimmed.to_string());

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if whole.len() > 3 || fraction.len() > SCALE_DIGITS {
            return Err(invalid());
        }
        let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(invalid());
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction_value: i64 = if fraction.is_empty() {
            0
        } else {
            format!("{fraction:0<SCALE_DIGITS$}")
                .parse()
                .map_err(|_| invalid())?
        };

        let magnitude = whole_value * SCALE + fraction_value;
        Ok(Self {
            micro_degrees: if negative { -magnitude } else { magnitude },
        })
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.micro_degrees < 0 { "-" } else { "" };
        let magnitude = self.micro_degrees.unsigned_abs();
        let scale = SCALE.unsigned_abs();
        write!(f, "{sign}{}.{:06}", magnitude / scale, magnitude % scale)
    }
}

impl From<Coordinate> for String {
    fn from(value: Coordinate) -> Self {
        value.to_string()
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ValidationError;

    fn try_from(value: RawCoordinate) -> Result<Self, Self::Error> {
        match value {
            RawCoordinate::Text(text) => text.parse(),
            RawCoordinate::Number(number) => Self::from_degrees(number),
        }
    }
}

/// Latitude/longitude pair with range checks applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GeoPoint {
    latitude: Coordinate,
    longitude: Coordinate,
}

impl GeoPoint {
    pub fn new(latitude: Coordinate, longitude: Coordinate) -> Result<Self, ValidationError> {
        if latitude.micro_degrees().abs() > MAX_LATITUDE_E6 {
            return Err(ValidationError::CoordinateOutOfRange {
                axis: "latitude",
                value: latitude.to_string(),
            });
        }
        if longitude.micro_degrees().abs() > MAX_LONGITUDE_E6 {
            return Err(ValidationError::CoordinateOutOfRange {
                axis: "longitude",
                value: longitude.to_string(),
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parses both axes from decimal text.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, ValidationError> {
        Self::new(latitude.parse()?, longitude.parse()?)
    }

    pub fn latitude(&self) -> Coordinate {
        self.latitude
    }

    pub fn longitude(&self) -> Coordinate {
        self.longitude
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub id: MarkerId,
    pub map_id: MapId,
    pub position: GeoPoint,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Creation input for a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMarker {
    pub map_id: MapId,
    pub position: GeoPoint,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl NewMarker {
    pub fn new(
        map_id: MapId,
        position: GeoPoint,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        Self {
            map_id,
            position,
            title: normalize_optional(title),
            description: normalize_optional(description),
        }
    }
}

/// Partial update for a marker. Moving one axis keeps the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerPatch {
    #[serde(default, deserialize_with = "present")]
    pub latitude: Option<Coordinate>,
    #[serde(default, deserialize_with = "present")]
    pub longitude: Option<Coordinate>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

impl MarkerPatch {
    pub fn apply(&self, marker: &mut Marker) -> Result<(), ValidationError> {
        if self.latitude.is_some() || self.longitude.is_some() {
            marker.position = GeoPoint::new(
                self.latitude.unwrap_or(marker.position.latitude()),
                self.longitude.unwrap_or(marker.position.longitude()),
            )?;
        }
        if let Some(title) = &self.title {
            marker.title = normalize_optional(title.as_deref());
        }
        if let Some(description) = &self.description {
            marker.description = normalize_optional(description.as_deref());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Coordinate, GeoPoint, MarkerPatch};
    use crate::model::patch::parse_patch;
    use crate::model::ValidationError;
    use serde_json::json;

    #[test]
    fn parses_decimal_text_without_rounding() {
        let value: Coordinate = "55.751244".parse().unwrap();
        assert_eq!(value.micro_degrees(), 55_751_244);
        assert_eq!(value.to_string(), "55.751244");

        let negative: Coordinate = "-0.5".parse().unwrap();
        assert_eq!(negative.micro_degrees(), -500_000);
        assert_eq!(negative.to_string(), "-0.500000");

        let whole: Coordinate = "+37".parse().unwrap();
        assert_eq!(whole.to_string(), "37.000000");
    }

    #[test]
    fn rejects_excess_precision_and_garbage() {
        for value in ["1.1234567", "", ".", "12a.5", "1.2.3", "--1", "1000"] {
            assert!(
                matches!(
                    value.parse::<Coordinate>(),
                    Err(ValidationError::InvalidCoordinate(_))
                ),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn geo_point_enforces_axis_ranges() {
        assert!(GeoPoint::parse("90", "-180").is_ok());
        assert!(matches!(
            GeoPoint::parse("90.000001", "0"),
            Err(ValidationError::CoordinateOutOfRange { axis: "latitude", .. })
        ));
        assert!(matches!(
            GeoPoint::parse("0", "180.5"),
            Err(ValidationError::CoordinateOutOfRange { axis: "longitude", .. })
        ));
    }

    #[test]
    fn float_input_rounds_to_micro_degrees() {
        let value = Coordinate::from_degrees(12.345_678_9).unwrap();
        assert_eq!(value.micro_degrees(), 12_345_679);
        assert!(Coordinate::from_degrees(f64::NAN).is_err());
    }

    #[test]
    fn patch_accepts_text_and_numeric_coordinates() {
        let patch: MarkerPatch =
            parse_patch(json!({ "latitude": "10.5", "longitude": 20.25, "title": null }))
                .unwrap();
        assert_eq!(patch.latitude.unwrap().micro_degrees(), 10_500_000);
        assert_eq!(patch.longitude.unwrap().micro_degrees(), 20_250_000);
        assert_eq!(patch.title, Some(None));
        assert_eq!(patch.description, None);
    }

    #[test]
    fn patch_rejects_null_coordinates() {
        assert!(parse_patch::<MarkerPatch>(json!({ "latitude": null })).is_err());
        assert!(parse_patch::<MarkerPatch>(json!({ "longitude": null, "title": "x" })).is_err());
    }
}
