use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::cards::{details_card, route_card, Card};
use crate::domain::{Candidate, RouteOption};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    #[default]
    None,
    ShowDetails,
    ShowRoute,
    Navigate,
    Call,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundEventKind {
    Maps,
    Telephone,
}

/// Tells the client to open its maps or phone app. Exactly one URI is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    maps_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    telephone_uri: Option<String>,
}

impl OutboundEvent {
    pub fn maps(uri: impl Into<String>) -> Self {
        Self { maps_uri: Some(uri.into()), telephone_uri: None }
    }

    pub fn telephone(uri: impl Into<String>) -> Self {
        Self { maps_uri: None, telephone_uri: Some(uri.into()) }
    }

    pub fn maps_uri(&self) -> Option<&str> {
        self.maps_uri.as_deref()
    }

    pub fn telephone_uri(&self) -> Option<&str> {
        self.telephone_uri.as_deref()
    }

    pub fn kind(&self) -> OutboundEventKind {
        if self.maps_uri.is_some() {
            OutboundEventKind::Maps
        } else {
            OutboundEventKind::Telephone
        }
    }

    pub fn uri(&self) -> &str {
        self.maps_uri.as_deref().or(self.telephone_uri.as_deref()).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatched {
    Card(Card),
    Event(OutboundEvent),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no action is pending")]
    NothingPending,
    #[error("a route must be planned before `{action:?}`")]
    RouteRequired { action: PendingAction },
    #[error("`{name}` has no phone number")]
    NoPhoneNumber { name: String },
}

#[derive(Clone, Debug, Default)]
pub struct ActionDispatcher;

impl ActionDispatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn dispatch(
        &self,
        action: PendingAction,
        target: &Candidate,
        route: Option<&RouteOption>,
    ) -> Result<Dispatched, DispatchError> {
        let dispatched = match action {
            PendingAction::None => return Err(DispatchError::NothingPending),
            PendingAction::ShowDetails => Dispatched::Card(details_card(target)),
            PendingAction::ShowRoute => {
                let route = route.ok_or(DispatchError::RouteRequired { action })?;
                Dispatched::Card(route_card(target, route, 1))
            }
            PendingAction::Navigate => {
                let route = route.ok_or(DispatchError::RouteRequired { action })?;
                Dispatched::Event(OutboundEvent::maps(target.maps_uri_via(route)))
            }
            PendingAction::Call => {
                let uri = target
                    .telephone_uri()
                    .ok_or_else(|| DispatchError::NoPhoneNumber { name: target.name.clone() })?;
                Dispatched::Event(OutboundEvent::telephone(uri))
            }
        };

        info!(
            event_name = "dispatch.completed",
            action = ?action,
            target_id = %target.id,
            "action dispatched"
        );
        Ok(dispatched)
    }
}
