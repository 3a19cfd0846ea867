//! Deterministic in-memory maps providers.
//!
//! Backed by a TOML catalog of places and canned routes. The embedded demo
//! catalog drives the test suites and the CLI when no fixture file is given.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::disambiguation::states::normalize;
use crate::domain::{
    Candidate, CandidateId, Coordinates, LocationQuery, Proximity, QueryTerm, RouteOption,
};
use crate::providers::{LocationProvider, ProviderError, RouteProvider};

const DEMO_FIXTURES: &str = include_str!("../resources/demo_fixtures.toml");
const ROAD_FACTOR: f64 = 1.3;
const URBAN_SPEED_METERS_PER_SEC: f64 = 11.1;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("could not read fixture file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse fixtures: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid fixtures: {0}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    #[default]
    Poi,
    Address,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixturePlace {
    #[serde(default)]
    pub kind: PlaceKind,
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl FixturePlace {
    fn to_candidate(&self) -> Candidate {
        Candidate {
            id: CandidateId(self.id.clone()),
            name: self.name.clone(),
            address: self.address.clone(),
            coordinates: self.coordinates,
            category: self.category.clone(),
            distance_meters: None,
            phone: self.phone.clone(),
        }
    }

    fn mentions(&self, needle: &str) -> bool {
        normalize(&self.name).contains(needle) || normalize(&self.address).contains(needle)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixtureRoutes {
    pub destination: String,
    #[serde(default)]
    pub options: Vec<RouteOption>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FixtureCatalog {
    #[serde(default)]
    pub places: Vec<FixturePlace>,
    #[serde(default)]
    pub routes: Vec<FixtureRoutes>,
}

impl FixtureCatalog {
    pub fn demo() -> Result<Self, FixtureError> {
        Self::from_toml_str(DEMO_FIXTURES)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| FixtureError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, FixtureError> {
        let catalog = toml::from_str::<Self>(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn place(&self, id: &CandidateId) -> Option<Candidate> {
        self.places.iter().find(|place| place.id == id.0).map(FixturePlace::to_candidate)
    }

    pub fn search(&self, query: &LocationQuery, origin: Option<Coordinates>) -> Vec<Candidate> {
        let matches = self
            .places
            .iter()
            .filter(|place| match &query.term {
                QueryTerm::Anything => place.kind == PlaceKind::Poi,
                QueryTerm::Category(category) => {
                    place.kind == PlaceKind::Poi
                        && place
                            .category
                            .as_deref()
                            .map(|value| normalize(value) == normalize(category))
                            .unwrap_or(false)
                }
                QueryTerm::Text(text) => {
                    place.kind == PlaceKind::Poi && place.mentions(&normalize(text))
                }
                QueryTerm::Address(address) => {
                    place.kind == PlaceKind::Address && place.mentions(&normalize(address))
                }
            })
            .collect::<Vec<_>>();

        let anchor = match &query.proximity {
            Proximity::NearAddress(address) => {
                let needle = normalize(address);
                let Some(anchor) = self
                    .places
                    .iter()
                    .find(|place| place.kind == PlaceKind::Address && place.mentions(&needle))
                else {
                    return Vec::new();
                };
                Some(anchor.coordinates)
            }
            _ => origin,
        };

        let mut candidates =
            matches.into_iter().map(FixturePlace::to_candidate).collect::<Vec<_>>();
        if let Some(anchor) = anchor {
            candidates.sort_by(|a, b| {
                anchor
                    .distance_meters(&a.coordinates)
                    .total_cmp(&anchor.distance_meters(&b.coordinates))
            });
        }
        candidates
    }

    pub fn routes_to(&self, origin: Coordinates, destination: &Candidate) -> Vec<RouteOption> {
        let canned = self.routes.iter().find(|routes| routes.destination == destination.id.0);
        if let Some(canned) = canned {
            return canned.options.clone();
        }

        let distance = origin.distance_meters(&destination.coordinates) * ROAD_FACTOR;
        vec![RouteOption {
            summary: "Direct route".to_string(),
            distance_meters: distance.round().max(1.0) as u32,
            duration_secs: (distance / URBAN_SPEED_METERS_PER_SEC).round().max(1.0) as u32,
            steps: vec![format!("Head to {}", destination.address)],
        }]
    }

    fn validate(&self) -> Result<(), FixtureError> {
        let mut ids = BTreeSet::new();
        for place in &self.places {
            if !ids.insert(place.id.as_str()) {
                return Err(FixtureError::Invalid(format!("duplicate place id `{}`", place.id)));
            }
            if !place.coordinates.is_valid() {
                return Err(FixtureError::Invalid(format!(
                    "place `{}` has out-of-range coordinates",
                    place.id
                )));
            }
        }

        for routes in &self.routes {
            if !ids.contains(routes.destination.as_str()) {
                return Err(FixtureError::Invalid(format!(
                    "routes reference unknown place `{}`",
                    routes.destination
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryLocationProvider {
    catalog: Arc<FixtureCatalog>,
    failure: Option<ProviderError>,
    latency: Option<Duration>,
}

impl InMemoryLocationProvider {
    pub fn new(catalog: FixtureCatalog) -> Self {
        Self::shared(Arc::new(catalog))
    }

    pub fn shared(catalog: Arc<FixtureCatalog>) -> Self {
        Self { catalog, failure: None, latency: None }
    }

    pub fn with_failure(mut self, failure: ProviderError) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl LocationProvider for InMemoryLocationProvider {
    async fn search(
        &self,
        query: &LocationQuery,
        origin: Option<Coordinates>,
    ) -> Result<Vec<Candidate>, ProviderError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self.catalog.search(query, origin))
    }
}

#[derive(Clone)]
pub struct InMemoryRouteProvider {
    catalog: Arc<FixtureCatalog>,
    failure: Option<ProviderError>,
}

impl InMemoryRouteProvider {
    pub fn new(catalog: FixtureCatalog) -> Self {
        Self::shared(Arc::new(catalog))
    }

    pub fn shared(catalog: Arc<FixtureCatalog>) -> Self {
        Self { catalog, failure: None }
    }

    pub fn with_failure(mut self, failure: ProviderError) -> Self {
        self.failure = Some(failure);
        self
    }
}

#[async_trait]
impl RouteProvider for InMemoryRouteProvider {
    async fn routes(
        &self,
        origin: Coordinates,
        destination: &Candidate,
    ) -> Result<Vec<RouteOption>, ProviderError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self.catalog.routes_to(origin, destination))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{Coordinates, LocationQuery, Proximity, QueryTerm};
    use crate::fixtures::{FixtureCatalog, FixtureError};

    fn names(candidates: &[crate::domain::Candidate]) -> Vec<&str> {
        candidates.iter().map(|candidate| candidate.name.as_str()).collect()
    }

    #[test]
    fn demo_catalog_is_valid() {
        let catalog = FixtureCatalog::demo().expect("demo fixtures parse");
        assert_eq!(catalog.places.len(), 12);
    }

    #[test]
    fn address_lookup_only_returns_addresses() {
        let catalog = FixtureCatalog::demo().expect("demo fixtures parse");
        let found = catalog.search(&LocationQuery::address("ave"), None);
        assert_eq!(names(&found), vec!["148th Ave NE", "156th Ave NE"]);
    }

    #[test]
    fn near_address_orders_around_the_anchor() {
        let catalog = FixtureCatalog::demo().expect("demo fixtures parse");
        let query = LocationQuery::new(
            QueryTerm::Category("parking".to_owned()),
            Proximity::NearAddress("148th ave".to_owned()),
        );
        let found = catalog.search(&query, Some(Coordinates::new(47.70, -122.13)));
        assert_eq!(names(&found), vec!["Overlake Garage", "Redmond Town Center Parking"]);
    }

    #[test]
    fn unknown_anchor_yields_nothing() {
        let catalog = FixtureCatalog::demo().expect("demo fixtures parse");
        let query = LocationQuery::new(
            QueryTerm::Category("parking".to_owned()),
            Proximity::NearAddress("atlantis".to_owned()),
        );
        assert!(catalog.search(&query, None).is_empty());
    }

    #[test]
    fn routes_must_reference_known_places() {
        let error = FixtureCatalog::from_toml_str(
            r#"
[[routes]]
destination = "missing"
"#,
        )
        .expect_err("unknown destination");
        assert!(matches!(error, FixtureError::Invalid(message) if message.contains("missing")));
    }
}
