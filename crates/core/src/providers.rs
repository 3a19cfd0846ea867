//! Seams to the external maps collaborators.
//!
//! Geocoding, place search and routing are owned by third-party providers.
//! The dialog only ever talks to them through these traits; the in-memory
//! implementations in [`crate::fixtures`] back tests and the CLI.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Candidate, Coordinates, LocationQuery, RouteOption};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider timed out after {0}ms")]
    Timeout(u64),
    #[error("provider rejected request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn search(
        &self,
        query: &LocationQuery,
        origin: Option<Coordinates>,
    ) -> Result<Vec<Candidate>, ProviderError>;
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn routes(
        &self,
        origin: Coordinates,
        destination: &Candidate,
    ) -> Result<Vec<RouteOption>, ProviderError>;
}
