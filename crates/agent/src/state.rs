use serde::{Deserialize, Serialize};
use waypoint_core::disambiguation::Disambiguation;
use waypoint_core::dispatch::PendingAction;
use waypoint_core::domain::{Candidate, Origin, RouteOption};

/// Everything one conversation carries between turns. Owned by exactly one
/// conversation and threaded through each turn by value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Sticky until the user cancels or fixes a new one.
    pub origin: Option<Origin>,
    pub stage: DialogStage,
    pub pending_action: PendingAction,
    pub welcomed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum DialogStage {
    #[default]
    Idle,
    /// Waiting for the user to say where they are. `origin_choice` holds the
    /// nested selection when their answer matched several addresses.
    AwaitingOrigin { resume: Resume, origin_choice: Option<Disambiguation> },
    Choosing(Disambiguation),
    Selected(SelectedTarget),
}

/// What to pick back up once the origin is fixed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Resume {
    Search(Disambiguation),
    Target(SelectedTarget),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedTarget {
    pub candidate: Candidate,
    /// Planned routes, primary first. Empty until directions are requested.
    pub routes: Vec<RouteOption>,
    pub route_index: usize,
}

impl SelectedTarget {
    pub fn new(candidate: Candidate) -> Self {
        Self { candidate, routes: Vec::new(), route_index: 0 }
    }

    pub fn chosen_route(&self) -> Option<&RouteOption> {
        self.routes.get(self.route_index).or_else(|| self.routes.first())
    }
}

impl DialogStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingOrigin { origin_choice: None, .. } => "awaiting_origin",
            Self::AwaitingOrigin { origin_choice: Some(_), .. } => "choosing_origin",
            Self::Choosing(_) => "choosing",
            Self::Selected(_) => "selected",
        }
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the in-flight dialog but keeps the origin and greeting.
    pub fn reset_dialog(&mut self) {
        self.stage = DialogStage::Idle;
        self.pending_action = PendingAction::None;
    }

    /// Full reset, as on an explicit cancel.
    pub fn clear(&mut self) {
        let welcomed = self.welcomed;
        *self = Self { welcomed, ..Self::default() };
    }

    pub fn selection(&self) -> Option<&Disambiguation> {
        match &self.stage {
            DialogStage::Choosing(selection) => Some(selection),
            DialogStage::AwaitingOrigin { origin_choice, .. } => origin_choice.as_ref(),
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<&SelectedTarget> {
        match &self.stage {
            DialogStage::Selected(target) => Some(target),
            _ => None,
        }
    }
}
