use thiserror::Error;

use crate::disambiguation::CancelReason;
use crate::dispatch::DispatchError;
use crate::planner::PlanError;
use crate::resolver::ResolveError;
use crate::responses::TemplateId;

/// Every way a dialog step can fail. Each kind renders a fixed reply, so
/// nothing reaches the user as a raw fault.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("an origin is required before searching")]
    OriginRequired,
    #[error("location provider unavailable: {0}")]
    ResolverUnavailable(String),
    #[error("no location matched the query")]
    NotFound,
    #[error("user declined every option")]
    UserDeclined,
    #[error("no route to the destination")]
    NoRouteFound,
    #[error("a route is required before navigating")]
    RouteRequired,
    #[error("the destination has no phone number")]
    NoPhoneNumber,
    #[error("no action is pending for the destination")]
    NothingPending,
}

impl DialogError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::OriginRequired => "origin_required",
            Self::ResolverUnavailable(_) => "resolver_unavailable",
            Self::NotFound => "not_found",
            Self::UserDeclined => "user_declined",
            Self::NoRouteFound => "no_route_found",
            Self::RouteRequired => "route_required",
            Self::NoPhoneNumber => "no_phone_number",
            Self::NothingPending => "nothing_pending",
        }
    }

    pub fn template(&self) -> TemplateId {
        match self {
            Self::OriginRequired => TemplateId::PromptForCurrentLocation,
            Self::ResolverUnavailable(_) => TemplateId::ServiceUnavailable,
            Self::NotFound => TemplateId::NoLocationsFound,
            Self::UserDeclined => TemplateId::Cancelling,
            Self::NoRouteFound => TemplateId::NoRouteFound,
            Self::RouteRequired => TemplateId::NoRouteFound,
            Self::NoPhoneNumber => TemplateId::NoPhoneNumber,
            Self::NothingPending => TemplateId::Unrecognized,
        }
    }

    /// Only a provider outage ends the current sub-dialog; everything else
    /// re-prompts or apologises in place.
    pub fn ends_subdialog(&self) -> bool {
        matches!(self, Self::ResolverUnavailable(_))
    }
}

impl From<ResolveError> for DialogError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::EmptyQuery => Self::NotFound,
            ResolveError::OriginRequired(_) => Self::OriginRequired,
            ResolveError::ResolverUnavailable(message) => Self::ResolverUnavailable(message),
        }
    }
}

impl From<PlanError> for DialogError {
    fn from(_: PlanError) -> Self {
        Self::NoRouteFound
    }
}

impl From<DispatchError> for DialogError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::NothingPending => Self::NothingPending,
            DispatchError::RouteRequired { .. } => Self::RouteRequired,
            DispatchError::NoPhoneNumber { .. } => Self::NoPhoneNumber,
        }
    }
}

impl From<CancelReason> for DialogError {
    fn from(value: CancelReason) -> Self {
        match value {
            CancelReason::NotFound => Self::NotFound,
            CancelReason::UserDeclined => Self::UserDeclined,
        }
    }
}
