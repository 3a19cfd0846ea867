pub mod cards;
pub mod config;
pub mod disambiguation;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod planner;
pub mod providers;
pub mod resolver;
pub mod responses;

pub use cards::{Card, CardBuilder, CardElement, CardKind};
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use disambiguation::{
    CancelReason, Disambiguation, DisambiguationEngine, SelectionEntry, SelectionEvent,
    SelectionNotice, SelectionPurpose, SelectionSet, SelectionState, TransitionOutcome,
};
pub use dispatch::{
    ActionDispatcher, DispatchError, Dispatched, OutboundEvent, OutboundEventKind, PendingAction,
};
pub use domain::{
    Candidate, CandidateId, Coordinates, LocationQuery, Origin, Proximity, QueryTerm, RouteOption,
};
pub use errors::DialogError;
pub use fixtures::{FixtureCatalog, InMemoryLocationProvider, InMemoryRouteProvider};
pub use planner::{PlanError, RoutePlanner, RouteRanking};
pub use providers::{LocationProvider, ProviderError, RouteProvider};
pub use resolver::{CandidateResolver, ResolveError};
pub use responses::{ResponseCatalog, ResponseError, TemplateArgs, TemplateId};
