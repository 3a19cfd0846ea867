use serde::Serialize;
use waypoint_core::cards::{Card, CardKind};
use waypoint_core::dispatch::OutboundEvent;

/// One activity sent back to the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Message(BotMessage),
    Event(OutboundEvent),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BotMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Message(BotMessage { text: Some(text.into()), cards: Vec::new() })
    }

    pub fn cards(text: Option<String>, cards: Vec<Card>) -> Self {
        Self::Message(BotMessage { text, cards })
    }

    pub fn message_text(&self) -> Option<&str> {
        match self {
            Self::Message(message) => message.text.as_deref(),
            Self::Event(_) => None,
        }
    }

    pub fn card_ids(&self) -> Vec<CardKind> {
        match self {
            Self::Message(message) => message.cards.iter().map(|card| card.id).collect(),
            Self::Event(_) => Vec::new(),
        }
    }

    pub fn event(&self) -> Option<&OutboundEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Message(_) => None,
        }
    }
}
