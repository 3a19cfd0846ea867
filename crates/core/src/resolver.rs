use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Candidate, Coordinates, LocationQuery, Proximity};
use crate::providers::{LocationProvider, ProviderError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("location query is empty")]
    EmptyQuery,
    #[error("query `{0}` is relative and no origin is known")]
    OriginRequired(String),
    #[error("location provider unavailable: {0}")]
    ResolverUnavailable(String),
}

/// Turns a query into an ordered candidate list through a [`LocationProvider`].
#[derive(Clone)]
pub struct CandidateResolver {
    provider: Arc<dyn LocationProvider>,
    timeout: Duration,
    search_radius_meters: f64,
}

impl CandidateResolver {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        timeout: Duration,
        search_radius_meters: f64,
    ) -> Self {
        Self { provider, timeout, search_radius_meters }
    }

    pub async fn resolve(
        &self,
        query: &LocationQuery,
        origin: Option<Coordinates>,
    ) -> Result<Vec<Candidate>, ResolveError> {
        if query.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }
        if query.is_relative() && origin.is_none() {
            return Err(ResolveError::OriginRequired(query.describe()));
        }

        let searched =
            tokio::time::timeout(self.timeout, self.provider.search(query, origin)).await;
        let candidates = match searched {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(error)) => {
                warn!(
                    event_name = "resolver.provider_failed",
                    query = %query.describe(),
                    error = %error,
                    "location provider failed"
                );
                return Err(ResolveError::ResolverUnavailable(error.to_string()));
            }
            Err(_) => {
                let error = ProviderError::Timeout(self.timeout.as_millis() as u64);
                warn!(
                    event_name = "resolver.provider_timeout",
                    query = %query.describe(),
                    error = %error,
                    "location provider timed out"
                );
                return Err(ResolveError::ResolverUnavailable(error.to_string()));
            }
        };

        let ordered = self.order(query, origin, candidates);
        debug!(
            event_name = "resolver.resolved",
            query = %query.describe(),
            candidate_count = ordered.len(),
            "location query resolved"
        );
        Ok(ordered)
    }

    fn order(
        &self,
        query: &LocationQuery,
        origin: Option<Coordinates>,
        candidates: Vec<Candidate>,
    ) -> Vec<Candidate> {
        let Some(origin) = origin else {
            return candidates;
        };

        let mut candidates = candidates
            .into_iter()
            .map(|candidate| candidate.with_distance_from(&origin))
            .collect::<Vec<_>>();

        if query.is_relative() {
            candidates.retain(|candidate| {
                candidate.distance_meters.unwrap_or(f64::MAX) <= self.search_radius_meters
            });
        }

        // Address-anchored searches are already ordered by the provider around
        // the anchor, not around the user.
        if !matches!(query.proximity, Proximity::NearAddress(_)) {
            candidates.sort_by(|a, b| {
                let a = a.distance_meters.unwrap_or(f64::MAX);
                let b = b.distance_meters.unwrap_or(f64::MAX);
                a.total_cmp(&b)
            });
        }

        if matches!(query.proximity, Proximity::Nearest) {
            candidates.truncate(1);
        }

        candidates
    }
}
