//! Scripted conversations for regression runs and the `replay` command.
//!
//! A script is a list of turns, each with the replies it must produce. Text
//! expectations name a response template rather than a literal string, so any
//! of the template's variants is accepted.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use waypoint_core::cards::CardKind;
use waypoint_core::dispatch::{OutboundEvent, OutboundEventKind};
use waypoint_core::domain::Coordinates;
use waypoint_core::responses::{TemplateArgs, TemplateId};

use crate::orchestrator::{DialogOrchestrator, TurnInput};
use crate::reply::Reply;
use crate::state::ConversationState;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay script {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse replay script: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("step {index}: {reason}")]
    InvalidStep { index: usize, reason: &'static str },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayStep {
    #[serde(default)]
    pub say: Option<String>,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub expect: Vec<Expectation>,
}

/// One expected reply. A missing text expectation means the reply must carry
/// no text; a missing event means it must not be an event.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    #[serde(default)]
    pub text: Option<TemplateId>,
    #[serde(default)]
    pub text_starts_with: Option<TemplateId>,
    #[serde(default)]
    pub args: TemplateArgs,
    #[serde(default)]
    pub cards: Vec<CardKind>,
    #[serde(default)]
    pub event: Option<OutboundEventKind>,
}

impl ReplayScript {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), steps: Vec::new() }
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ReplayError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ReplayError> {
        let script: Self = toml::from_str(raw)?;
        for (index, step) in script.steps.iter().enumerate() {
            step.input(index)?;
        }
        Ok(script)
    }

    pub fn say(mut self, text: impl Into<String>, expect: Vec<Expectation>) -> Self {
        self.steps.push(ReplayStep { say: Some(text.into()), location: None, expect });
        self
    }

    pub fn location(mut self, coordinates: Coordinates, expect: Vec<Expectation>) -> Self {
        self.steps.push(ReplayStep { say: None, location: Some(coordinates), expect });
        self
    }
}

impl ReplayStep {
    pub fn input(&self, index: usize) -> Result<TurnInput, ReplayError> {
        match (&self.say, self.location) {
            (Some(text), None) => Ok(TurnInput::Utterance(text.clone())),
            (None, Some(coordinates)) => Ok(TurnInput::Location(coordinates)),
            (Some(_), Some(_)) => {
                let reason = "set either `say` or `location`, not both";
                Err(ReplayError::InvalidStep { index, reason })
            }
            (None, None) => {
                Err(ReplayError::InvalidStep { index, reason: "step needs `say` or `location`" })
            }
        }
    }

    fn describe(&self) -> String {
        match (&self.say, self.location) {
            (Some(text), _) => format!("say {text:?}"),
            (None, Some(coordinates)) => {
                format!("location {:.4},{:.4}", coordinates.latitude, coordinates.longitude)
            }
            (None, None) => "empty step".to_owned(),
        }
    }
}

impl Expectation {
    pub fn text(id: TemplateId) -> Self {
        Self { text: Some(id), ..Self::default() }
    }

    pub fn text_starting_with(id: TemplateId) -> Self {
        Self { text_starts_with: Some(id), ..Self::default() }
    }

    pub fn cards(cards: impl IntoIterator<Item = CardKind>) -> Self {
        Self { cards: cards.into_iter().collect(), ..Self::default() }
    }

    pub fn event(kind: OutboundEventKind) -> Self {
        Self { event: Some(kind), ..Self::default() }
    }

    pub fn with_cards(mut self, cards: impl IntoIterator<Item = CardKind>) -> Self {
        self.cards = cards.into_iter().collect();
        self
    }

    pub fn with_arg(mut self, key: &str, value: impl ToString) -> Self {
        self.args = self.args.with(key, value);
        self
    }
}

#[derive(Clone, Debug)]
pub struct StepReport {
    pub index: usize,
    pub input: String,
    pub replies: Vec<Reply>,
    pub failures: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ReplayReport {
    pub script: String,
    pub steps: Vec<StepReport>,
    pub final_state: ConversationState,
}

impl ReplayReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|step| step.failures.is_empty())
    }

    pub fn failure_count(&self) -> usize {
        self.steps.iter().map(|step| step.failures.len()).sum()
    }

    /// Every failure prefixed with its 1-based step number.
    pub fn failure_lines(&self) -> Vec<String> {
        self.steps
            .iter()
            .flat_map(|step| {
                step.failures
                    .iter()
                    .map(move |failure| {
                        format!("step {} ({}): {failure}", step.index + 1, step.input)
                    })
            })
            .collect()
    }
}

/// Plays `script` against a fresh conversation.
pub async fn replay(orchestrator: &DialogOrchestrator, script: &ReplayScript) -> ReplayReport {
    let mut state = ConversationState::new();
    let mut steps = Vec::with_capacity(script.steps.len());

    for (index, step) in script.steps.iter().enumerate() {
        let input = match step.input(index) {
            Ok(input) => input,
            Err(error) => {
                steps.push(StepReport {
                    index,
                    input: step.describe(),
                    replies: Vec::new(),
                    failures: vec![error.to_string()],
                });
                continue;
            }
        };

        let outcome = orchestrator.handle_turn(state, input).await;
        state = outcome.state;
        let failures = check_replies(orchestrator, &step.expect, &outcome.replies);
        debug!(
            event_name = "replay.step_checked",
            script = %script.name,
            step = index + 1,
            failures = failures.len(),
            "replay step checked"
        );
        steps.push(StepReport {
            index,
            input: step.describe(),
            replies: outcome.replies,
            failures,
        });
    }

    let report = ReplayReport { script: script.name.clone(), steps, final_state: state };
    info!(
        event_name = "replay.completed",
        script = %report.script,
        passed = report.passed(),
        failures = report.failure_count(),
        "replay script completed"
    );
    report
}

fn check_replies(
    orchestrator: &DialogOrchestrator,
    expected: &[Expectation],
    replies: &[Reply],
) -> Vec<String> {
    let mut failures = Vec::new();
    if expected.len() != replies.len() {
        failures.push(format!("expected {} replies, got {}", expected.len(), replies.len()));
    }
    for (position, (expectation, reply)) in expected.iter().zip(replies).enumerate() {
        for failure in check_reply(orchestrator, expectation, reply) {
            failures.push(format!("reply {}: {failure}", position + 1));
        }
    }
    failures
}

fn check_reply(
    orchestrator: &DialogOrchestrator,
    expectation: &Expectation,
    reply: &Reply,
) -> Vec<String> {
    let mut failures = Vec::new();
    let actual_text = reply.message_text();

    match (expectation.text, expectation.text_starts_with) {
        (Some(id), _) => match variants(orchestrator, id, &expectation.args) {
            Ok(variants) => {
                if !actual_text.is_some_and(|text| variants.iter().any(|variant| variant == text)) {
                    failures.push(format!("expected `{}` text, got {actual_text:?}", id.key()));
                }
            }
            Err(error) => failures.push(error),
        },
        (None, Some(id)) => match variants(orchestrator, id, &expectation.args) {
            Ok(variants) => {
                let matched = actual_text.is_some_and(|text| {
                    variants.iter().any(|variant| text.starts_with(variant.as_str()))
                });
                if !matched {
                    failures.push(format!(
                        "expected text starting with `{}`, got {actual_text:?}",
                        id.key()
                    ));
                }
            }
            Err(error) => failures.push(error),
        },
        (None, None) => {
            if let Some(text) = actual_text {
                failures.push(format!("expected no text, got {text:?}"));
            }
        }
    }

    let cards = reply.card_ids();
    if cards != expectation.cards {
        failures.push(format!("expected cards {:?}, got {cards:?}", expectation.cards));
    }

    let event = reply.event().map(OutboundEvent::kind);
    if event != expectation.event {
        failures.push(format!("expected event {:?}, got {event:?}", expectation.event));
    }
    failures
}

fn variants(
    orchestrator: &DialogOrchestrator,
    id: TemplateId,
    args: &TemplateArgs,
) -> Result<Vec<String>, String> {
    orchestrator
        .responses()
        .variants(id, orchestrator.locale(), args)
        .map_err(|error| format!("cannot render `{}`: {error}", id.key()))
}
