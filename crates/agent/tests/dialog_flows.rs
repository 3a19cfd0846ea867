use std::sync::Arc;
use std::time::Duration;

use waypoint_agent::{
    replay, ConversationState, DialogOrchestrator, DialogStage, Expectation, KeywordRecognizer,
    ReplayScript, Reply, TurnInput,
};
use waypoint_core::cards::CardKind;
use waypoint_core::config::AppConfig;
use waypoint_core::dispatch::{OutboundEventKind, PendingAction};
use waypoint_core::domain::{Coordinates, Origin};
use waypoint_core::fixtures::{FixtureCatalog, InMemoryLocationProvider, InMemoryRouteProvider};
use waypoint_core::providers::ProviderError;
use waypoint_core::responses::{ResponseCatalog, TemplateArgs, TemplateId};

fn device() -> Coordinates {
    Coordinates::new(47.6423, -122.1368)
}

fn demo() -> FixtureCatalog {
    FixtureCatalog::demo().expect("demo fixtures")
}

fn orchestrator() -> DialogOrchestrator {
    DialogOrchestrator::from_fixtures(&AppConfig::default(), demo()).expect("embedded responses")
}

fn text(id: TemplateId) -> Expectation {
    Expectation::text(id)
}

fn overview(id: TemplateId) -> Expectation {
    Expectation::text(id).with_cards([CardKind::Overview])
}

fn card(kind: CardKind) -> Expectation {
    Expectation::cards([kind])
}

fn maps() -> Expectation {
    Expectation::event(OutboundEventKind::Maps)
}

/// Starts with a device location already pushed.
fn located(name: &str) -> ReplayScript {
    ReplayScript::new(name).location(device(), vec![])
}

async fn assert_script(script: ReplayScript) {
    let report = replay(&orchestrator(), &script).await;
    assert!(report.passed(), "{}: {:#?}", script.name, report.failure_lines());
}

async fn turn(
    orchestrator: &DialogOrchestrator,
    state: ConversationState,
    utterance: &str,
) -> (ConversationState, Vec<Reply>) {
    let outcome = orchestrator.handle_turn(state, TurnInput::Utterance(utterance.to_owned())).await;
    (outcome.state, outcome.replies)
}

async fn located_state(orchestrator: &DialogOrchestrator) -> ConversationState {
    orchestrator.handle_turn(ConversationState::new(), TurnInput::Location(device())).await.state
}

#[tokio::test]
async fn route_to_nearest_point_of_interest() {
    let script = ReplayScript::new("route to nearest")
        .say("", vec![text(TemplateId::Welcome)])
        .location(device(), vec![])
        .say("find the nearest point of interest", vec![card(CardKind::DetailsNoCall)])
        .say("show directions", vec![card(CardKind::Route)])
        .say("start navigation", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn origin_is_reprompted_after_declining_address_matches() {
    let script = ReplayScript::new("reprompt origin")
        .say(
            "find the nearest point of interest",
            vec![text(TemplateId::PromptForCurrentLocation)],
        )
        .say("ave", vec![overview(TemplateId::CurrentLocationMultipleSelection)])
        .say("no", vec![text(TemplateId::PromptForCurrentLocation)])
        .say("ave", vec![overview(TemplateId::CurrentLocationMultipleSelection)])
        .say("option one", vec![card(CardKind::DetailsNoCall)])
        .say("show directions", vec![card(CardKind::Route)])
        .say("start navigation", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn selects_destination_by_index() {
    let script = located("select by index")
        .say("what's nearby", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option one", vec![card(CardKind::DetailsNoCall)])
        .say("show directions", vec![card(CardKind::Route)])
        .say("start navigation", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn selects_destination_by_name() {
    let script = located("select by name")
        .say("what's nearby", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("Microsoft Way", vec![card(CardKind::DetailsNoCall)]);
    assert_script(script).await;
}

#[tokio::test]
async fn selecting_none_cancels_and_forgets_the_origin() {
    let orchestrator = orchestrator();
    let state = located_state(&orchestrator).await;
    let (state, _) = turn(&orchestrator, state, "what's nearby").await;
    let (state, replies) = turn(&orchestrator, state, "none").await;

    assert_eq!(replies.len(), 1);
    let variants = orchestrator
        .responses()
        .variants(TemplateId::Cancelling, "en", &Default::default())
        .expect("cancelling renders");
    assert!(variants.iter().any(|variant| Some(variant.as_str()) == replies[0].message_text()));
    assert_eq!(state, ConversationState { welcomed: false, ..ConversationState::new() });
}

#[tokio::test]
async fn category_search_groups_same_named_places() {
    let orchestrator = orchestrator();
    let state = located_state(&orchestrator).await;
    let (state, replies) = turn(&orchestrator, state, "find a pharmacy").await;

    assert_eq!(replies[0].card_ids(), vec![CardKind::Overview]);
    let DialogStage::Choosing(selection) = &state.stage else {
        panic!("expected a selection, got {:?}", state.stage);
    };
    let labels = selection.set.entries().iter().map(|entry| entry.label()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["Overlake Pharmacy", "QFC Pharmacy", "Bartell Drugs"]);

    let script = located("category group")
        .say("find a pharmacy", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option three", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option one", vec![card(CardKind::DetailsNoCall)])
        .say("show directions", vec![card(CardKind::Route)])
        .say("start navigation", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn calls_a_place_with_a_phone_number() {
    let script = located("call")
        .say("what's nearby", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option two", vec![card(CardKind::Details)])
        .say("call", vec![Expectation::event(OutboundEventKind::Telephone)]);
    assert_script(script).await;
}

#[tokio::test]
async fn calling_a_place_without_a_phone_keeps_it_selected() {
    let orchestrator = orchestrator();
    let state = located_state(&orchestrator).await;
    let (state, _) = turn(&orchestrator, state, "find the nearest point of interest").await;
    let (state, replies) = turn(&orchestrator, state, "call").await;

    let expected = orchestrator
        .responses()
        .variants(
            TemplateId::NoPhoneNumber,
            "en",
            &TemplateArgs::new().with("name", "Microsoft Way Coffee"),
        )
        .expect("no_phone_number renders");
    assert!(expected.iter().any(|variant| Some(variant.as_str()) == replies[0].message_text()));
    assert!(matches!(state.stage, DialogStage::Selected(_)));
    assert_eq!(state.pending_action, PendingAction::None);
}

#[tokio::test]
async fn start_navigation_plans_a_route_on_demand() {
    let script = located("start navigation")
        .say("what's nearby", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option one", vec![card(CardKind::DetailsNoCall)])
        .say("start navigation", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn a_new_search_interrupts_any_selection() {
    let script = located("interrupt")
        .say("what's nearby", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("find a pharmacy", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option one", vec![card(CardKind::DetailsNoCall)])
        .say("find parking nearby", vec![overview(TemplateId::MultipleLocationsFound)]);
    assert_script(script).await;
}

#[tokio::test]
async fn multiple_routes_are_offered_and_one_can_be_picked() {
    let script = located("multiple routes")
        .say("what's nearby", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option two", vec![card(CardKind::Details)])
        .say(
            "show directions",
            vec![Expectation::text_starting_with(TemplateId::MultipleRoutesFound)
                .with_arg("count", 2)
                .with_cards([CardKind::Route, CardKind::Route])],
        )
        .say("option two", vec![card(CardKind::Route)])
        .say("start navigation", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn picked_route_is_the_one_navigated() {
    let orchestrator = orchestrator();
    let mut state = located_state(&orchestrator).await;
    for utterance in ["what's nearby", "option two", "show directions", "option two"] {
        state = turn(&orchestrator, state, utterance).await.0;
    }

    let DialogStage::Selected(target) = &state.stage else {
        panic!("expected a selected target, got {:?}", state.stage);
    };
    assert_eq!(target.route_index, 1);
    assert_eq!(target.chosen_route().map(|route| route.summary.as_str()), Some("via NE 40th St"));
}

#[tokio::test]
async fn navigation_follows_the_picked_route() {
    let orchestrator = orchestrator();

    let mut primary = located_state(&orchestrator).await;
    for utterance in ["what's nearby", "option two", "show directions"] {
        primary = turn(&orchestrator, primary, utterance).await.0;
    }
    let (_, primary_replies) = turn(&orchestrator, primary, "start navigation").await;

    let mut picked = located_state(&orchestrator).await;
    for utterance in ["what's nearby", "option two", "show directions", "option two"] {
        picked = turn(&orchestrator, picked, utterance).await.0;
    }
    let (_, picked_replies) = turn(&orchestrator, picked, "start navigation").await;

    fn maps_uri(replies: &[Reply]) -> Option<String> {
        match replies {
            [Reply::Event(event)] => event.maps_uri().map(str::to_owned),
            other => panic!("expected a single maps event, got {other:?}"),
        }
    }
    assert_eq!(
        maps_uri(&primary_replies).as_deref(),
        Some("geo:47.6441,-122.1368?route=via-156th-ave-ne")
    );
    assert_eq!(
        maps_uri(&picked_replies).as_deref(),
        Some("geo:47.6441,-122.1368?route=via-ne-40th-st")
    );
}

#[tokio::test]
async fn parking_nearby() {
    let script = located("parking nearby")
        .say("find parking nearby", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option one", vec![card(CardKind::Details)])
        .say("show directions", vec![card(CardKind::Route)])
        .say("start navigation", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn nearest_parking_then_cancel() {
    let script = located("nearest parking")
        .say("find the nearest parking", vec![card(CardKind::Details)])
        .say("cancel", vec![text(TemplateId::Cancelling)]);
    assert_script(script).await;
}

#[tokio::test]
async fn help_restates_the_pending_prompt() {
    let script = located("help")
        .say("find the nearest parking", vec![card(CardKind::Details)])
        .say("help", vec![text(TemplateId::Help), card(CardKind::Details)])
        .say("repeat", vec![card(CardKind::Details)]);
    assert_script(script).await;
}

#[tokio::test]
async fn help_while_choosing_keeps_the_current_page() {
    let orchestrator = orchestrator();
    let state = located_state(&orchestrator).await;
    let (state, _) = turn(&orchestrator, state, "what's nearby").await;
    let (state, paged) = turn(&orchestrator, state, "more").await;
    let DialogStage::Choosing(before) = state.stage.clone() else {
        panic!("expected an open selection, got {:?}", state.stage);
    };
    assert_eq!(before.current_page(), Some(1));

    let (state, replies) = turn(&orchestrator, state, "help").await;

    assert_eq!(replies.len(), 2);
    let help_variants = orchestrator
        .responses()
        .variants(TemplateId::Help, orchestrator.locale(), &TemplateArgs::new())
        .expect("help renders");
    let Reply::Message(help) = &replies[0] else {
        panic!("expected the help text first, got {:?}", replies[0]);
    };
    assert!(help.text.as_ref().is_some_and(|text| help_variants.contains(text)));

    let overview_cards = |replies: &[Reply]| {
        replies
            .iter()
            .filter_map(|reply| match reply {
                Reply::Message(message) => Some(message.cards.clone()),
                Reply::Event(_) => None,
            })
            .flatten()
            .filter(|card| card.id == CardKind::Overview)
            .collect::<Vec<_>>()
    };
    let rerendered = overview_cards(&replies[1..]);
    assert_eq!(rerendered.len(), 1);
    assert_eq!(rerendered, overview_cards(&paged[..]));
    assert_eq!(state.stage, DialogStage::Choosing(before));
}

#[tokio::test]
async fn parking_near_an_address_asks_for_the_origin_first() {
    let script = ReplayScript::new("parking near address")
        .say("find parking near 148th ave", vec![text(TemplateId::PromptForCurrentLocation)])
        .say("ave", vec![overview(TemplateId::CurrentLocationMultipleSelection)])
        .say("option one", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option one", vec![card(CardKind::Details)])
        .say("show directions", vec![card(CardKind::Route)])
        .say("start navigation", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn get_directions_navigates_once_chosen() {
    let script = located("get directions")
        .say("get directions to microsoft", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option one", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn directions_to_the_nearest_category_navigate_immediately() {
    let script = located("directions to nearest")
        .say("get directions to the nearest pharmacy", vec![maps()]);
    assert_script(script).await;
}

#[tokio::test]
async fn route_from_an_address_fixes_the_origin() {
    let orchestrator = orchestrator();
    let utterance = "directions from 148th ave to the nearest pharmacy";
    let (state, replies) = turn(&orchestrator, ConversationState::new(), utterance).await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].event().is_some());
    match &state.origin {
        Some(Origin::Address(candidate)) => assert_eq!(candidate.name, "148th Ave NE"),
        other => panic!("expected an address origin, got {other:?}"),
    }
}

#[tokio::test]
async fn paging_and_out_of_range_choices_keep_the_list_open() {
    let script = located("paging")
        .say("what's nearby", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("option nine", vec![overview(TemplateId::OptionOutOfRange)])
        .say("more", vec![overview(TemplateId::MultipleLocationsFound)])
        .say("more", vec![overview(TemplateId::NoMoreOptions)])
        .say("zzz", vec![overview(TemplateId::NoNameMatch)])
        .say("option one", vec![card(CardKind::Details)]);
    // Page two opens with the visitor center, which lists a phone number.
    assert_script(script).await;
}

#[tokio::test]
async fn actions_without_a_destination_are_refused() {
    let script = located("no destination")
        .say("start navigation", vec![text(TemplateId::NoDestination)])
        .say("call", vec![text(TemplateId::NoDestination)])
        .say("blorp", vec![text(TemplateId::Unrecognized)]);
    assert_script(script).await;
}

#[tokio::test]
async fn welcome_is_sent_once() {
    let script = ReplayScript::new("welcome once")
        .say("", vec![text(TemplateId::Welcome)])
        .say("", vec![]);
    assert_script(script).await;
}

#[tokio::test]
async fn provider_outage_ends_the_search_politely() {
    let config = AppConfig::default();
    let catalog = Arc::new(demo());
    let orchestrator = DialogOrchestrator::new(
        &config,
        Arc::new(KeywordRecognizer::new()),
        Arc::new(
            InMemoryLocationProvider::shared(catalog.clone())
                .with_failure(ProviderError::Unavailable("maintenance".to_owned())),
        ),
        Arc::new(InMemoryRouteProvider::shared(catalog)),
        Arc::new(ResponseCatalog::embedded().expect("embedded responses")),
    );

    let state = located_state(&orchestrator).await;
    let (state, replies) = turn(&orchestrator, state, "find parking nearby").await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].message_text().is_some_and(|text| text.contains("isn't responding")));
    assert_eq!(state.stage, DialogStage::Idle);
    assert!(state.origin.is_some());
}

#[tokio::test]
async fn slow_provider_times_out() {
    let mut config = AppConfig::default();
    config.providers.timeout_ms = 20;
    let catalog = Arc::new(demo());
    let orchestrator = DialogOrchestrator::new(
        &config,
        Arc::new(KeywordRecognizer::new()),
        Arc::new(
            InMemoryLocationProvider::shared(catalog.clone())
                .with_latency(Duration::from_millis(500)),
        ),
        Arc::new(InMemoryRouteProvider::shared(catalog)),
        Arc::new(ResponseCatalog::embedded().expect("embedded responses")),
    );

    let state = located_state(&orchestrator).await;
    let (_, replies) = turn(&orchestrator, state, "what's nearby").await;
    assert!(replies[0].message_text().is_some_and(|text| text.contains("isn't responding")));
}

#[tokio::test]
async fn route_failure_keeps_the_destination() {
    let config = AppConfig::default();
    let catalog = Arc::new(demo());
    let orchestrator = DialogOrchestrator::new(
        &config,
        Arc::new(KeywordRecognizer::new()),
        Arc::new(InMemoryLocationProvider::shared(catalog.clone())),
        Arc::new(
            InMemoryRouteProvider::shared(catalog)
                .with_failure(ProviderError::Rejected("no road network".to_owned())),
        ),
        Arc::new(ResponseCatalog::embedded().expect("embedded responses")),
    );

    let state = located_state(&orchestrator).await;
    let (state, _) = turn(&orchestrator, state, "find the nearest parking").await;
    let (state, replies) = turn(&orchestrator, state, "start navigation").await;

    assert!(replies[0].message_text().is_some_and(|text| text.contains("couldn't find a route")));
    assert!(matches!(state.stage, DialogStage::Selected(_)));
}

#[tokio::test]
async fn destination_without_routes_reports_no_route() {
    let orchestrator = orchestrator();
    let state = located_state(&orchestrator).await;
    let (state, _) = turn(&orchestrator, state, "get directions to microsoft").await;
    let (state, replies) = turn(&orchestrator, state, "option two").await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].event().is_none());
    assert!(replies[0].message_text().is_some_and(|text| text.contains("couldn't find a route")));
    assert!(matches!(state.stage, DialogStage::Selected(_)));
}

#[tokio::test]
async fn searches_without_an_origin_when_policy_allows() {
    let mut config = AppConfig::default();
    config.dialog.require_origin_before_search = false;
    let orchestrator = DialogOrchestrator::from_fixtures(&config, demo()).expect("responses");

    let (state, replies) = turn(&orchestrator, ConversationState::new(), "find a pharmacy").await;
    assert_eq!(replies[0].card_ids(), vec![CardKind::Overview]);
    assert!(state.origin.is_none());

    let (state, replies) = turn(&orchestrator, state, "find parking nearby").await;
    assert!(matches!(state.stage, DialogStage::AwaitingOrigin { .. }));
    assert_eq!(replies.len(), 1);
}

#[tokio::test]
async fn invalid_device_location_is_ignored() {
    let orchestrator = orchestrator();
    let outcome = orchestrator
        .handle_turn(ConversationState::new(), TurnInput::Location(Coordinates::new(123.0, 0.0)))
        .await;
    assert!(outcome.replies.is_empty());
    assert!(outcome.state.origin.is_none());
}

#[tokio::test]
async fn location_event_resumes_a_parked_search() {
    let orchestrator = orchestrator();
    let (state, _) =
        turn(&orchestrator, ConversationState::new(), "find the nearest parking").await;
    assert!(matches!(state.stage, DialogStage::AwaitingOrigin { .. }));

    let outcome = orchestrator.handle_turn(state, TurnInput::Location(device())).await;
    assert_eq!(outcome.replies.len(), 1);
    assert_eq!(outcome.replies[0].card_ids(), vec![CardKind::Details]);
}

#[tokio::test]
async fn origin_survives_a_completed_navigation() {
    let orchestrator = orchestrator();
    let state = located_state(&orchestrator).await;
    let (state, _) = turn(&orchestrator, state, "get directions to the nearest pharmacy").await;

    assert_eq!(state.stage, DialogStage::Idle);
    assert_eq!(state.pending_action, PendingAction::None);
    assert_eq!(state.origin, Some(Origin::Device(device())));
}

#[tokio::test]
async fn conversation_state_serializes_mid_dialog() {
    let orchestrator = orchestrator();
    let state = located_state(&orchestrator).await;
    let (state, _) = turn(&orchestrator, state, "find a pharmacy").await;

    let json = serde_json::to_string(&state).expect("state serializes");
    let restored: ConversationState = serde_json::from_str(&json).expect("state deserializes");
    assert_eq!(restored, state);

    let (_, replies) = turn(&orchestrator, restored, "option one").await;
    assert_eq!(replies[0].card_ids(), vec![CardKind::DetailsNoCall]);
}

#[tokio::test]
async fn replies_serialize_as_tagged_activities() {
    let orchestrator = orchestrator();
    let state = located_state(&orchestrator).await;
    let (_, replies) = turn(&orchestrator, state, "get directions to the nearest pharmacy").await;

    let json = serde_json::to_value(&replies[0]).expect("reply serializes");
    assert_eq!(json["type"], "event");
    assert!(json["mapsUri"].as_str().is_some_and(|uri| uri.starts_with("geo:")));
}
