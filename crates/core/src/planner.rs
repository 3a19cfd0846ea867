use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Candidate, Coordinates, RouteOption};
use crate::providers::RouteProvider;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRanking {
    /// Keep the provider's order; its first option is the default route.
    #[default]
    ProviderOrder,
    Fastest,
}

impl std::str::FromStr for RouteRanking {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "provider_order" => Ok(Self::ProviderOrder),
            "fastest" => Ok(Self::Fastest),
            other => Err(format!(
                "unsupported route ranking `{other}` (expected provider_order|fastest)"
            )),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("no route found to `{destination}`")]
    NoRouteFound { destination: String },
    #[error("route provider unavailable: {0}")]
    ProviderUnavailable(String),
}

#[derive(Clone)]
pub struct RoutePlanner {
    provider: Arc<dyn RouteProvider>,
    ranking: RouteRanking,
    timeout: Duration,
}

impl RoutePlanner {
    pub fn new(provider: Arc<dyn RouteProvider>, ranking: RouteRanking, timeout: Duration) -> Self {
        Self { provider, ranking, timeout }
    }

    /// Returns a non-empty list; the first element is the primary route.
    pub async fn plan(
        &self,
        origin: Coordinates,
        destination: &Candidate,
    ) -> Result<Vec<RouteOption>, PlanError> {
        let planned =
            tokio::time::timeout(self.timeout, self.provider.routes(origin, destination)).await;
        let mut options = match planned {
            Ok(Ok(options)) => options,
            Ok(Err(error)) => {
                warn!(
                    event_name = "planner.provider_failed",
                    destination_id = %destination.id,
                    error = %error,
                    "route provider failed"
                );
                return Err(PlanError::ProviderUnavailable(error.to_string()));
            }
            Err(_) => {
                warn!(
                    event_name = "planner.provider_timeout",
                    destination_id = %destination.id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "route provider timed out"
                );
                return Err(PlanError::ProviderUnavailable(format!(
                    "timed out after {}ms",
                    self.timeout.as_millis()
                )));
            }
        };

        if options.is_empty() {
            return Err(PlanError::NoRouteFound { destination: destination.name.clone() });
        }

        if self.ranking == RouteRanking::Fastest {
            options.sort_by_key(|option| option.duration_secs);
        }

        debug!(
            event_name = "planner.planned",
            destination_id = %destination.id,
            option_count = options.len(),
            "routes planned"
        );
        Ok(options)
    }
}
