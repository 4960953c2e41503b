// src/types/geopoint.rs

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Represents a geographical point.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParseGeoPoint {
    #[serde(rename = "__type")]
    type_field: String, // Should always be "GeoPoint"
    pub latitude: f64,
    pub longitude: f64,
}

impl ParseGeoPoint {
    /// Creates a new `ParseGeoPoint`, rejecting coordinates outside the valid ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ParseError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ParseError::InvalidInput(format!(
                "Latitude {} must be between -90 and 90 degrees.",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ParseError::InvalidInput(format!(
                "Longitude {} must be between -180 and 180 degrees.",
                longitude
            )));
        }
        Ok(ParseGeoPoint {
            type_field: "GeoPoint".to_string(),
            latitude,
            longitude,
        })
    }
}
