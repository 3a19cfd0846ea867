use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::orchestrator::{DialogOrchestrator, TurnInput};
use crate::reply::Reply;
use crate::state::ConversationState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ConversationId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

#[derive(Debug)]
struct Session {
    state: ConversationState,
    last_active: DateTime<Utc>,
}

impl Session {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self { state: ConversationState::new(), last_active: now }
    }

    fn idle_longer_than(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        (now - self.last_active).to_std().map(|idle| idle >= timeout).unwrap_or(false)
    }
}

/// Hosts many conversations over one orchestrator.
///
/// Turns for the same conversation run one at a time; different
/// conversations never block each other beyond the brief registry lookup.
pub struct SkillHost {
    orchestrator: Arc<DialogOrchestrator>,
    sessions: Mutex<HashMap<ConversationId, Arc<Mutex<Session>>>>,
    idle_timeout: Duration,
}

impl SkillHost {
    pub fn new(orchestrator: Arc<DialogOrchestrator>, idle_timeout: Duration) -> Self {
        Self { orchestrator, sessions: Mutex::new(HashMap::new()), idle_timeout }
    }

    pub fn orchestrator(&self) -> &DialogOrchestrator {
        &self.orchestrator
    }

    pub async fn start_conversation(&self) -> ConversationId {
        let id = ConversationId::new();
        self.sessions.lock().await.insert(id, Arc::new(Mutex::new(Session::fresh(Utc::now()))));
        info!(event_name = "session.started", conversation_id = %id, "conversation started");
        id
    }

    pub async fn handle(&self, id: ConversationId, input: TurnInput) -> Vec<Reply> {
        self.handle_at(id, input, Utc::now()).await
    }

    /// Runs one turn. Unknown ids start a fresh conversation; a session idle
    /// past the timeout starts over before the turn is applied. Other idle
    /// conversations are dropped on the way in.
    pub async fn handle_at(
        &self,
        id: ConversationId,
        input: TurnInput,
        now: DateTime<Utc>,
    ) -> Vec<Reply> {
        let session = {
            let mut sessions = self.sessions.lock().await;
            self.prune_idle(&mut sessions, now, Some(id));
            sessions.entry(id).or_insert_with(|| Arc::new(Mutex::new(Session::fresh(now)))).clone()
        };

        let mut session = session.lock().await;
        if session.idle_longer_than(self.idle_timeout, now) {
            info!(
                event_name = "session.expired",
                conversation_id = %id,
                "stale conversation reset"
            );
            session.state = ConversationState::new();
        }

        let state = std::mem::take(&mut session.state);
        let outcome = self
            .orchestrator
            .handle_turn(state, input)
            .instrument(info_span!("turn", conversation_id = %id))
            .await;
        session.state = outcome.state;
        session.last_active = now;
        outcome.replies
    }

    pub async fn snapshot(&self, id: ConversationId) -> Option<ConversationState> {
        let session = self.sessions.lock().await.get(&id).cloned()?;
        let session = session.lock().await;
        Some(session.state.clone())
    }

    /// Drops every conversation idle past the timeout. Sessions mid-turn are
    /// left alone.
    pub async fn expire_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        self.prune_idle(&mut sessions, now, None)
    }

    pub async fn active_conversations(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn prune_idle(
        &self,
        sessions: &mut HashMap<ConversationId, Arc<Mutex<Session>>>,
        now: DateTime<Utc>,
        keep: Option<ConversationId>,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|id, session| {
            if Some(*id) == keep {
                return true;
            }
            match session.try_lock() {
                Ok(session) => !session.idle_longer_than(self.idle_timeout, now),
                Err(_) => true,
            }
        });
        let expired = before - sessions.len();
        if expired > 0 {
            info!(event_name = "session.expired_batch", expired, "idle conversations dropped");
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use waypoint_core::config::AppConfig;
    use waypoint_core::domain::Coordinates;
    use waypoint_core::fixtures::FixtureCatalog;

    use crate::orchestrator::{DialogOrchestrator, TurnInput};
    use crate::session::{ConversationId, SkillHost};

    fn host() -> SkillHost {
        let catalog = FixtureCatalog::demo().expect("demo fixtures");
        let orchestrator = DialogOrchestrator::from_fixtures(&AppConfig::default(), catalog)
            .expect("embedded responses");
        SkillHost::new(Arc::new(orchestrator), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn conversations_keep_separate_state() {
        let host = host();
        let first = host.start_conversation().await;
        let second = host.start_conversation().await;

        host.handle(first, TurnInput::Location(Coordinates::new(47.6423, -122.1368))).await;

        let first_state = host.snapshot(first).await.expect("first session");
        let second_state = host.snapshot(second).await.expect("second session");
        assert!(first_state.origin.is_some());
        assert!(second_state.origin.is_none());
        assert_eq!(host.active_conversations().await, 2);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let host = host();
        let start = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let stale = ConversationId::new();
        let fresh = ConversationId::new();

        host.handle_at(stale, TurnInput::Utterance(String::new()), start).await;
        let later = start + chrono::Duration::seconds(30);
        host.handle_at(fresh, TurnInput::Utterance(String::new()), later).await;

        let expired = host.expire_idle(start + chrono::Duration::seconds(70)).await;
        assert_eq!(expired, 1);
        assert!(host.snapshot(stale).await.is_none());
        assert!(host.snapshot(fresh).await.is_some());
    }

    #[tokio::test]
    async fn serving_a_turn_drops_other_idle_sessions() {
        let host = host();
        let start = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let abandoned = host.start_conversation().await;
        host.handle_at(abandoned, TurnInput::Utterance(String::new()), start).await;

        let active = ConversationId::new();
        let later = start + chrono::Duration::seconds(90);
        host.handle_at(active, TurnInput::Utterance(String::new()), later).await;

        assert!(host.snapshot(abandoned).await.is_none());
        assert!(host.snapshot(active).await.is_some());
        assert_eq!(host.active_conversations().await, 1);
    }

    #[tokio::test]
    async fn stale_session_restarts_before_the_turn() {
        let host = host();
        let start = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let id = host.start_conversation().await;

        let greeting = host.handle_at(id, TurnInput::Utterance(String::new()), start).await;
        assert_eq!(greeting.len(), 1);
        let repeat = host.handle_at(id, TurnInput::Utterance(String::new()), start).await;
        assert!(repeat.is_empty());

        let later = start + chrono::Duration::minutes(5);
        let greeting_again = host.handle_at(id, TurnInput::Utterance(String::new()), later).await;
        assert_eq!(greeting_again.len(), 1);
    }

    #[test]
    fn conversation_ids_round_trip_through_text() {
        let id = ConversationId::new();
        let parsed: ConversationId = id.to_string().parse().expect("uuid text");
        assert_eq!(parsed, id);
    }
}
