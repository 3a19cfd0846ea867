//! Dialog runtime for the waypoint skill.
//!
//! This crate turns utterances into replies:
//! - `intent` classifies what the user said
//! - `orchestrator` runs one turn against the core resolver, disambiguation
//!   engine, planner and dispatcher
//! - `session` hosts many conversations with per-conversation serialization
//! - `replay` plays scripted conversations and checks the replies
//!
//! # Turn model
//!
//! Each turn takes the conversation state by value and returns the next state
//! with its replies. Nothing is shared between conversations, and no turn
//! fails: every error kind renders a fixed reply.

pub mod intent;
pub mod orchestrator;
pub mod replay;
pub mod reply;
pub mod session;
pub mod state;

pub use intent::{Intent, IntentRecognizer, KeywordRecognizer, OptionChoice, RecognizerError};
pub use orchestrator::{DialogOrchestrator, TurnInput, TurnOutcome};
pub use replay::{
    replay, Expectation, ReplayError, ReplayReport, ReplayScript, ReplayStep, StepReport,
};
pub use reply::{BotMessage, Reply};
pub use session::{ConversationId, SkillHost};
pub use state::{ConversationState, DialogStage, Resume, SelectedTarget};
