use serde::{Deserialize, Serialize};

use crate::domain::route::RouteOption;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance using the haversine formula.
    pub fn distance_meters(&self, other: &Coordinates) -> f64 {
        let lat_a = self.latitude.to_radians();
        let lat_b = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let h = (delta_lat / 2.0).sin().powi(2)
            + lat_a.cos() * lat_b.cos() * (delta_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
    }

    pub fn geo_uri(&self) -> String {
        format!("geo:{},{}", self.latitude, self.longitude)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Candidate {
    pub fn has_phone(&self) -> bool {
        self.phone
            .as_deref()
            .is_some_and(|phone| phone.chars().any(|ch| ch.is_ascii_digit()))
    }

    /// `tel:` URI with everything except digits and a leading `+` stripped.
    pub fn telephone_uri(&self) -> Option<String> {
        if !self.has_phone() {
            return None;
        }

        let raw = self.phone.as_deref().unwrap_or_default().trim();
        let mut digits = String::with_capacity(raw.len());
        if raw.starts_with('+') {
            digits.push('+');
        }
        digits.extend(raw.chars().filter(char::is_ascii_digit));
        Some(format!("tel:{digits}"))
    }

    /// `geo:` URI for navigating here along `route`.
    pub fn maps_uri_via(&self, route: &RouteOption) -> String {
        format!("{}?route={}", self.coordinates.geo_uri(), route.slug())
    }

    pub fn with_distance_from(mut self, origin: &Coordinates) -> Self {
        self.distance_meters = Some(origin.distance_meters(&self.coordinates));
        self
    }
}
