//! Per-turn dialog sequencing.
//!
//! [`DialogOrchestrator::handle_turn`] takes the conversation state by value,
//! runs at most one resolver or planner call chain, and hands back the next
//! state with the replies to send. It never fails: every error kind renders a
//! fixed reply instead.

use std::sync::Arc;

use tracing::{debug, info, warn};
use waypoint_core::cards::{details_card, overview_card, route_card};
use waypoint_core::config::AppConfig;
use waypoint_core::disambiguation::{
    CancelReason, Disambiguation, DisambiguationEngine, SelectionEvent, SelectionNotice,
    SelectionPurpose, SelectionState,
};
use waypoint_core::dispatch::{ActionDispatcher, Dispatched, PendingAction};
use waypoint_core::domain::{Candidate, Coordinates, LocationQuery, Origin};
use waypoint_core::errors::DialogError;
use waypoint_core::fixtures::{FixtureCatalog, InMemoryLocationProvider, InMemoryRouteProvider};
use waypoint_core::planner::RoutePlanner;
use waypoint_core::providers::{LocationProvider, RouteProvider};
use waypoint_core::resolver::CandidateResolver;
use waypoint_core::responses::{ResponseCatalog, ResponseError, TemplateArgs, TemplateId};

use crate::intent::{Intent, IntentRecognizer, KeywordRecognizer, OptionChoice};
use crate::reply::Reply;
use crate::state::{ConversationState, DialogStage, Resume, SelectedTarget};

#[derive(Clone, Debug, PartialEq)]
pub enum TurnInput {
    Utterance(String),
    /// Device coordinates pushed by the client.
    Location(Coordinates),
}

#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub state: ConversationState,
    pub replies: Vec<Reply>,
}

pub struct DialogOrchestrator {
    recognizer: Arc<dyn IntentRecognizer>,
    resolver: CandidateResolver,
    planner: RoutePlanner,
    engine: DisambiguationEngine,
    dispatcher: ActionDispatcher,
    responses: Arc<ResponseCatalog>,
    locale: String,
    require_origin_before_search: bool,
}

impl DialogOrchestrator {
    pub fn new(
        config: &AppConfig,
        recognizer: Arc<dyn IntentRecognizer>,
        locations: Arc<dyn LocationProvider>,
        routes: Arc<dyn RouteProvider>,
        responses: Arc<ResponseCatalog>,
    ) -> Self {
        let timeout = config.providers.timeout();
        Self {
            recognizer,
            resolver: CandidateResolver::new(
                locations,
                timeout,
                config.providers.search_radius_meters,
            ),
            planner: RoutePlanner::new(routes, config.providers.route_ranking, timeout),
            engine: DisambiguationEngine::new(config.dialog.page_size),
            dispatcher: ActionDispatcher::new(),
            responses,
            locale: config.dialog.locale.clone(),
            require_origin_before_search: config.dialog.require_origin_before_search,
        }
    }

    /// Keyword recognizer and in-memory providers over `fixtures`.
    pub fn from_fixtures(
        config: &AppConfig,
        fixtures: FixtureCatalog,
    ) -> Result<Self, ResponseError> {
        let fixtures = Arc::new(fixtures);
        Ok(Self::new(
            config,
            Arc::new(KeywordRecognizer::new()),
            Arc::new(InMemoryLocationProvider::shared(fixtures.clone())),
            Arc::new(InMemoryRouteProvider::shared(fixtures)),
            Arc::new(ResponseCatalog::embedded()?),
        ))
    }

    pub fn responses(&self) -> &ResponseCatalog {
        &self.responses
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub async fn handle_turn(&self, state: ConversationState, input: TurnInput) -> TurnOutcome {
        let mut state = state;
        let mut replies = Vec::new();
        let from_stage = state.stage.label();

        match input {
            TurnInput::Location(coordinates) => {
                self.receive_location(&mut state, coordinates, &mut replies).await;
            }
            TurnInput::Utterance(text) if text.trim().is_empty() => {
                if !state.welcomed {
                    state.welcomed = true;
                    self.say(&mut replies, TemplateId::Welcome, TemplateArgs::new());
                }
            }
            TurnInput::Utterance(text) => match self.recognizer.recognize(&text).await {
                Ok(intent) => {
                    debug!(
                        event_name = "dialog.intent_recognized",
                        intent = intent.name(),
                        stage = from_stage,
                        "intent recognized"
                    );
                    self.route_intent(&mut state, intent, &mut replies).await;
                }
                Err(error) => {
                    warn!(
                        event_name = "dialog.recognizer_failed",
                        error = %error,
                        "intent recognizer failed"
                    );
                    self.say(&mut replies, TemplateId::ServiceUnavailable, TemplateArgs::new());
                }
            },
        }

        info!(
            event_name = "dialog.turn_completed",
            from_stage,
            to_stage = state.stage.label(),
            pending_action = ?state.pending_action,
            reply_count = replies.len(),
            "dialog turn completed"
        );
        TurnOutcome { state, replies }
    }

    async fn receive_location(
        &self,
        state: &mut ConversationState,
        coordinates: Coordinates,
        replies: &mut Vec<Reply>,
    ) {
        if !coordinates.is_valid() {
            warn!(
                event_name = "dialog.location_rejected",
                latitude = coordinates.latitude,
                longitude = coordinates.longitude,
                "ignoring out-of-range device location"
            );
            return;
        }

        state.origin = Some(Origin::Device(coordinates));
        if matches!(state.stage, DialogStage::AwaitingOrigin { .. }) {
            self.resume(state, replies).await;
        }
    }

    async fn route_intent(
        &self,
        state: &mut ConversationState,
        intent: Intent,
        replies: &mut Vec<Reply>,
    ) {
        match intent {
            Intent::Help => {
                self.say(replies, TemplateId::Help, TemplateArgs::new());
                self.render_prompt(state, replies);
                return;
            }
            Intent::Repeat => {
                if !self.render_prompt(state, replies) {
                    self.say(replies, TemplateId::Unrecognized, TemplateArgs::new());
                }
                return;
            }
            Intent::Cancel => {
                info!(
                    event_name = "dialog.cancelled",
                    stage = state.stage.label(),
                    "conversation cancelled by user"
                );
                state.clear();
                self.say(replies, TemplateId::Cancelling, TemplateArgs::new());
                return;
            }
            _ => {}
        }

        if let Intent::RouteFromXToY { from, to } = &intent {
            self.start_route(state, from.clone(), to.clone(), replies).await;
            return;
        }
        if let Some(query) = intent.query() {
            self.start_search(state, query, PendingAction::None, replies).await;
            return;
        }

        match &state.stage {
            DialogStage::Idle => match intent {
                Intent::ShowDirections | Intent::StartNavigation | Intent::Call => {
                    self.say(replies, TemplateId::NoDestination, TemplateArgs::new());
                }
                _ => self.say(replies, TemplateId::Unrecognized, TemplateArgs::new()),
            },
            DialogStage::Choosing(_) => match selection_event(intent) {
                Some(event) => self.advance_selection(state, event, replies).await,
                None => {
                    self.say(replies, TemplateId::NoDestination, TemplateArgs::new());
                    self.render_prompt(state, replies);
                }
            },
            DialogStage::AwaitingOrigin { origin_choice: Some(_), .. } => {
                match selection_event(intent) {
                    Some(event) => self.advance_origin_selection(state, event, replies).await,
                    None => {
                        self.render_prompt(state, replies);
                    }
                }
            }
            DialogStage::AwaitingOrigin { origin_choice: None, .. } => match intent {
                Intent::Unrecognized(text) => self.answer_origin(state, &text, replies).await,
                _ => self.say(replies, TemplateId::PromptForCurrentLocation, TemplateArgs::new()),
            },
            DialogStage::Selected(_) => match intent {
                Intent::ShowDirections => self.show_directions(state, replies).await,
                Intent::StartNavigation => self.navigate(state, replies).await,
                Intent::Call => self.call(state, replies),
                Intent::SelectOption(OptionChoice::Ordinal(ordinal)) => {
                    self.pick_route(state, ordinal, replies);
                }
                _ => self.say(replies, TemplateId::Unrecognized, TemplateArgs::new()),
            },
        }
    }

    /// Tears down whatever was in flight and runs `query`, asking for the
    /// origin first when policy requires it.
    async fn start_search(
        &self,
        state: &mut ConversationState,
        query: LocationQuery,
        pending: PendingAction,
        replies: &mut Vec<Reply>,
    ) {
        state.stage = DialogStage::Idle;
        state.pending_action = pending;

        let needs_origin = self.require_origin_before_search || query.is_relative();
        if state.origin.is_none() && needs_origin {
            self.await_origin(state, Resume::Search(self.engine.await_origin(query)), replies);
            return;
        }
        self.run_search(state, query, replies).await;
    }

    async fn start_route(
        &self,
        state: &mut ConversationState,
        from: Option<String>,
        to: LocationQuery,
        replies: &mut Vec<Reply>,
    ) {
        let Some(from) = from else {
            self.start_search(state, to, PendingAction::Navigate, replies).await;
            return;
        };

        state.pending_action = PendingAction::Navigate;
        state.stage = DialogStage::AwaitingOrigin {
            resume: Resume::Search(self.engine.await_origin(to)),
            origin_choice: None,
        };
        self.answer_origin(state, &from, replies).await;
    }

    fn await_origin(
        &self,
        state: &mut ConversationState,
        resume: Resume,
        replies: &mut Vec<Reply>,
    ) {
        info!(
            event_name = "dialog.origin_requested",
            pending_action = ?state.pending_action,
            "asking for the current location"
        );
        state.stage = DialogStage::AwaitingOrigin { resume, origin_choice: None };
        self.say(replies, TemplateId::PromptForCurrentLocation, TemplateArgs::new());
    }

    async fn run_search(
        &self,
        state: &mut ConversationState,
        query: LocationQuery,
        replies: &mut Vec<Reply>,
    ) {
        let origin = state.origin.as_ref().map(Origin::coordinates);
        let resolved = self.resolver.resolve(&query, origin).await;
        let candidates = match resolved {
            Ok(candidates) => candidates,
            Err(error) => {
                let error = DialogError::from(error);
                if error == DialogError::OriginRequired {
                    let resume = Resume::Search(self.engine.await_origin(query));
                    self.await_origin(state, resume, replies);
                } else {
                    state.reset_dialog();
                    self.report(replies, &error, TemplateArgs::new());
                }
                return;
            }
        };

        let (selection, notices) =
            self.engine.begin(SelectionPurpose::Destination, query, origin, candidates);
        self.settle_destination(state, selection, &notices, replies).await;
    }

    async fn advance_selection(
        &self,
        state: &mut ConversationState,
        event: SelectionEvent,
        replies: &mut Vec<Reply>,
    ) {
        let DialogStage::Choosing(current) = &state.stage else {
            return;
        };
        match self.engine.apply(current, &event) {
            Ok(outcome) => {
                info!(
                    event_name = "dialog.selection_transition",
                    from = outcome.from.label(),
                    to = outcome.to().label(),
                    event = ?outcome.event,
                    "selection advanced"
                );
                self.settle_destination(state, outcome.next, &outcome.notices, replies).await;
            }
            Err(error) => {
                warn!(
                    event_name = "dialog.selection_rejected",
                    error = %error,
                    "selection event rejected"
                );
                state.reset_dialog();
                self.say(replies, TemplateId::Unrecognized, TemplateArgs::new());
            }
        }
    }

    async fn settle_destination(
        &self,
        state: &mut ConversationState,
        selection: Disambiguation,
        notices: &[SelectionNotice],
        replies: &mut Vec<Reply>,
    ) {
        match selection.state.clone() {
            SelectionState::Presenting { page } => {
                let text = self.selection_text(notices, TemplateId::MultipleLocationsFound);
                replies.push(Reply::cards(text, vec![overview_card(&selection.set, page)]));
                state.stage = DialogStage::Choosing(selection);
            }
            SelectionState::Resolved(candidate) => {
                self.select_target(state, candidate, replies).await
            }
            SelectionState::Cancelled(CancelReason::NotFound) => {
                state.reset_dialog();
                self.report(replies, &DialogError::NotFound, TemplateArgs::new());
            }
            SelectionState::Cancelled(CancelReason::UserDeclined) => {
                state.clear();
                self.report(replies, &DialogError::UserDeclined, TemplateArgs::new());
            }
            SelectionState::AwaitingOrigin => {
                self.await_origin(state, Resume::Search(selection), replies);
            }
        }
    }

    async fn select_target(
        &self,
        state: &mut ConversationState,
        candidate: Candidate,
        replies: &mut Vec<Reply>,
    ) {
        info!(
            event_name = "dialog.destination_selected",
            candidate_id = %candidate.id,
            pending_action = ?state.pending_action,
            "destination selected"
        );
        state.stage = DialogStage::Selected(SelectedTarget::new(candidate));
        self.continue_with_target(state, replies).await;
    }

    async fn continue_with_target(&self, state: &mut ConversationState, replies: &mut Vec<Reply>) {
        match state.pending_action {
            PendingAction::Navigate => self.navigate(state, replies).await,
            PendingAction::ShowRoute => self.show_directions(state, replies).await,
            PendingAction::Call => self.call(state, replies),
            PendingAction::None | PendingAction::ShowDetails => {
                state.pending_action = PendingAction::ShowDetails;
                if let DialogStage::Selected(target) = &state.stage {
                    match self.dispatcher.dispatch(
                        PendingAction::ShowDetails,
                        &target.candidate,
                        None,
                    ) {
                        Ok(Dispatched::Card(card)) => replies.push(Reply::cards(None, vec![card])),
                        Ok(Dispatched::Event(event)) => replies.push(Reply::Event(event)),
                        Err(error) => self.report(replies, &error.into(), TemplateArgs::new()),
                    }
                }
                state.pending_action = PendingAction::None;
            }
        }
    }

    /// Plans routes for the selected target unless already planned. Returns
    /// `false` when the caller must stop, having already replied.
    async fn ensure_routes(&self, state: &mut ConversationState, replies: &mut Vec<Reply>) -> bool {
        let origin = state.origin.as_ref().map(Origin::coordinates);
        let DialogStage::Selected(target) = &mut state.stage else {
            self.say(replies, TemplateId::NoDestination, TemplateArgs::new());
            return false;
        };
        if !target.routes.is_empty() {
            return true;
        }

        let Some(origin) = origin else {
            let resume = Resume::Target(target.clone());
            self.await_origin(state, resume, replies);
            return false;
        };

        let planned = self.planner.plan(origin, &target.candidate).await;
        match planned {
            Ok(routes) => {
                target.routes = routes;
                target.route_index = 0;
                true
            }
            Err(error) => {
                state.pending_action = PendingAction::None;
                self.report(replies, &error.into(), TemplateArgs::new());
                false
            }
        }
    }

    async fn show_directions(&self, state: &mut ConversationState, replies: &mut Vec<Reply>) {
        state.pending_action = PendingAction::ShowRoute;
        if !self.ensure_routes(state, replies).await {
            return;
        }
        let DialogStage::Selected(target) = &state.stage else {
            return;
        };

        if target.routes.len() > 1 {
            let args = TemplateArgs::new().with("count", target.routes.len());
            let text = self.text(TemplateId::MultipleRoutesFound, &args);
            let cards = target
                .routes
                .iter()
                .enumerate()
                .map(|(index, route)| route_card(&target.candidate, route, index + 1))
                .collect();
            replies.push(Reply::cards(text, cards));
        } else {
            match self.dispatcher.dispatch(
                PendingAction::ShowRoute,
                &target.candidate,
                target.chosen_route(),
            ) {
                Ok(Dispatched::Card(card)) => replies.push(Reply::cards(None, vec![card])),
                Ok(Dispatched::Event(event)) => replies.push(Reply::Event(event)),
                Err(error) => self.report(replies, &error.into(), TemplateArgs::new()),
            }
        }
        state.pending_action = PendingAction::None;
    }

    fn pick_route(&self, state: &mut ConversationState, ordinal: usize, replies: &mut Vec<Reply>) {
        let DialogStage::Selected(target) = &mut state.stage else {
            return;
        };
        if target.routes.len() < 2 {
            self.say(replies, TemplateId::Unrecognized, TemplateArgs::new());
            return;
        }

        let Some(route) = ordinal.checked_sub(1).and_then(|index| target.routes.get(index)) else {
            let args = TemplateArgs::new().with("ordinal", ordinal);
            self.say(replies, TemplateId::OptionOutOfRange, args);
            return;
        };
        let card = route_card(&target.candidate, route, ordinal);
        target.route_index = ordinal - 1;
        debug!(event_name = "dialog.route_chosen", ordinal, "route chosen for navigation");
        replies.push(Reply::cards(None, vec![card]));
    }

    async fn navigate(&self, state: &mut ConversationState, replies: &mut Vec<Reply>) {
        state.pending_action = PendingAction::Navigate;
        if !self.ensure_routes(state, replies).await {
            return;
        }
        let DialogStage::Selected(target) = &state.stage else {
            return;
        };

        let dispatched = self
            .dispatcher
            .dispatch(PendingAction::Navigate, &target.candidate, target.chosen_route())
            .map_err(DialogError::from);
        self.finish_dispatch(state, dispatched, TemplateArgs::new(), replies);
    }

    fn call(&self, state: &mut ConversationState, replies: &mut Vec<Reply>) {
        let DialogStage::Selected(target) = &state.stage else {
            self.say(replies, TemplateId::NoDestination, TemplateArgs::new());
            return;
        };

        // Calling never attaches routing; the route stays planned for later.
        let args = TemplateArgs::new().with("name", &target.candidate.name);
        let dispatched = self.dispatcher.dispatch(PendingAction::Call, &target.candidate, None);
        state.pending_action = PendingAction::Call;
        self.finish_dispatch(state, dispatched.map_err(DialogError::from), args, replies);
    }

    fn finish_dispatch(
        &self,
        state: &mut ConversationState,
        dispatched: Result<Dispatched, DialogError>,
        error_args: TemplateArgs,
        replies: &mut Vec<Reply>,
    ) {
        match dispatched {
            Ok(Dispatched::Event(event)) => {
                replies.push(Reply::Event(event));
                state.reset_dialog();
            }
            Ok(Dispatched::Card(card)) => {
                replies.push(Reply::cards(None, vec![card]));
                state.pending_action = PendingAction::None;
            }
            Err(error) => {
                state.pending_action = PendingAction::None;
                self.report(replies, &error, error_args);
            }
        }
    }

    /// Treats `text` as the user's answer to "where are you?".
    async fn answer_origin(
        &self,
        state: &mut ConversationState,
        text: &str,
        replies: &mut Vec<Reply>,
    ) {
        let query = LocationQuery::address(text);
        let resolved = self.resolver.resolve(&query, None).await;
        match resolved {
            Ok(candidates) => {
                let (choice, notices) =
                    self.engine.begin(SelectionPurpose::Origin, query, None, candidates);
                self.settle_origin(state, choice, &notices, replies).await;
            }
            Err(error) => {
                let error = DialogError::from(error);
                if error.ends_subdialog() {
                    state.reset_dialog();
                    self.report(replies, &error, TemplateArgs::new());
                } else {
                    self.say(replies, TemplateId::PromptForCurrentLocation, TemplateArgs::new());
                }
            }
        }
    }

    async fn advance_origin_selection(
        &self,
        state: &mut ConversationState,
        event: SelectionEvent,
        replies: &mut Vec<Reply>,
    ) {
        let DialogStage::AwaitingOrigin { origin_choice: Some(current), .. } = &state.stage else {
            return;
        };
        match self.engine.apply(current, &event) {
            Ok(outcome) => {
                info!(
                    event_name = "dialog.origin_transition",
                    from = outcome.from.label(),
                    to = outcome.to().label(),
                    event = ?outcome.event,
                    "origin selection advanced"
                );
                self.settle_origin(state, outcome.next, &outcome.notices, replies).await;
            }
            Err(error) => {
                warn!(
                    event_name = "dialog.selection_rejected",
                    error = %error,
                    "origin selection event rejected"
                );
                set_origin_choice(state, None);
                self.say(replies, TemplateId::PromptForCurrentLocation, TemplateArgs::new());
            }
        }
    }

    async fn settle_origin(
        &self,
        state: &mut ConversationState,
        choice: Disambiguation,
        notices: &[SelectionNotice],
        replies: &mut Vec<Reply>,
    ) {
        match choice.state.clone() {
            SelectionState::Resolved(candidate) => {
                info!(
                    event_name = "dialog.origin_fixed",
                    candidate_id = %candidate.id,
                    "origin fixed from address"
                );
                state.origin = Some(Origin::Address(candidate));
                self.resume(state, replies).await;
            }
            SelectionState::Presenting { page } => {
                let text =
                    self.selection_text(notices, TemplateId::CurrentLocationMultipleSelection);
                replies.push(Reply::cards(text, vec![overview_card(&choice.set, page)]));
                set_origin_choice(state, Some(choice));
            }
            // A declined or empty origin choice asks again; the outer query stays parked.
            SelectionState::Cancelled(_) | SelectionState::AwaitingOrigin => {
                set_origin_choice(state, None);
                self.say(replies, TemplateId::PromptForCurrentLocation, TemplateArgs::new());
            }
        }
    }

    async fn resume(&self, state: &mut ConversationState, replies: &mut Vec<Reply>) {
        let DialogStage::AwaitingOrigin { resume, .. } = std::mem::take(&mut state.stage) else {
            return;
        };
        match resume {
            Resume::Search(parked) => {
                let query = parked.set.query().clone();
                self.run_search(state, query, replies).await;
            }
            Resume::Target(target) => {
                state.stage = DialogStage::Selected(target);
                self.continue_with_target(state, replies).await;
            }
        }
    }

    /// Re-renders whatever the user was last asked. Returns `false` when
    /// nothing is pending.
    fn render_prompt(&self, state: &ConversationState, replies: &mut Vec<Reply>) -> bool {
        match &state.stage {
            DialogStage::Idle => false,
            DialogStage::AwaitingOrigin { origin_choice: None, .. } => {
                self.say(replies, TemplateId::PromptForCurrentLocation, TemplateArgs::new());
                true
            }
            DialogStage::AwaitingOrigin { origin_choice: Some(choice), .. } => {
                let text =
                    self.text(TemplateId::CurrentLocationMultipleSelection, &TemplateArgs::new());
                let page = choice.current_page().unwrap_or_default();
                replies.push(Reply::cards(text, vec![overview_card(&choice.set, page)]));
                true
            }
            DialogStage::Choosing(selection) => {
                let text = self.text(TemplateId::MultipleLocationsFound, &TemplateArgs::new());
                let page = selection.current_page().unwrap_or_default();
                replies.push(Reply::cards(text, vec![overview_card(&selection.set, page)]));
                true
            }
            DialogStage::Selected(target) => {
                replies.push(Reply::cards(None, vec![details_card(&target.candidate)]));
                true
            }
        }
    }

    fn selection_text(&self, notices: &[SelectionNotice], default: TemplateId) -> Option<String> {
        let notice = notices.iter().find_map(|notice| match notice {
            SelectionNotice::NoMoreOptions => {
                Some((TemplateId::NoMoreOptions, TemplateArgs::new()))
            }
            SelectionNotice::OrdinalOutOfRange { ordinal } => {
                Some((TemplateId::OptionOutOfRange, TemplateArgs::new().with("ordinal", ordinal)))
            }
            SelectionNotice::NoNameMatch { text } => {
                Some((TemplateId::NoNameMatch, TemplateArgs::new().with("text", text)))
            }
            _ => None,
        });
        let (id, args) = notice.unwrap_or((default, TemplateArgs::new()));
        self.text(id, &args)
    }

    fn report(&self, replies: &mut Vec<Reply>, error: &DialogError, args: TemplateArgs) {
        info!(
            event_name = "dialog.error_reported",
            reason_code = error.reason_code(),
            error = %error,
            "dialog error rendered as reply"
        );
        self.say(replies, error.template(), args);
    }

    fn text(&self, id: TemplateId, args: &TemplateArgs) -> Option<String> {
        match self.responses.render(id, &self.locale, args) {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(
                    event_name = "dialog.render_failed",
                    template = id.key(),
                    error = %error,
                    "response template failed to render"
                );
                None
            }
        }
    }

    fn say(&self, replies: &mut Vec<Reply>, id: TemplateId, args: TemplateArgs) {
        if let Some(text) = self.text(id, &args) {
            replies.push(Reply::text(text));
        }
    }
}

fn selection_event(intent: Intent) -> Option<SelectionEvent> {
    match intent {
        Intent::SelectOption(OptionChoice::Ordinal(ordinal)) => {
            Some(SelectionEvent::Ordinal(ordinal))
        }
        Intent::SelectOption(OptionChoice::Name(text)) | Intent::Unrecognized(text) => {
            Some(SelectionEvent::Name(text))
        }
        Intent::SelectOption(OptionChoice::More) => Some(SelectionEvent::NextPage),
        Intent::SelectOption(OptionChoice::None) => Some(SelectionEvent::Decline),
        _ => None,
    }
}

fn set_origin_choice(state: &mut ConversationState, choice: Option<Disambiguation>) {
    if let DialogStage::AwaitingOrigin { origin_choice, .. } = &mut state.stage {
        *origin_choice = choice;
    }
}
