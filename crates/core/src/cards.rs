//! Card payloads for the chat client.
//!
//! Every card carries a stable `id` naming its template; clients and tests
//! switch on it, so the serialized names must never change.

use serde::{Deserialize, Serialize};

use crate::disambiguation::{SelectionEntry, SelectionSet};
use crate::domain::{Candidate, RouteOption};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    Overview,
    Details,
    DetailsNoCall,
    Route,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Details => "Details",
            Self::DetailsNoCall => "DetailsNoCall",
            Self::Route => "Route",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardElement {
    Text { text: String },
    Fact { label: String, value: String },
    Choice { ordinal: usize, label: String, detail: String },
    Action { action_id: String, label: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: CardKind,
    pub title: String,
    pub body: Vec<CardElement>,
}

pub struct CardBuilder {
    id: CardKind,
    title: String,
    body: Vec<CardElement>,
}

impl CardBuilder {
    pub fn new(id: CardKind, title: impl Into<String>) -> Self {
        Self { id, title: title.into(), body: Vec::new() }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body.push(CardElement::Text { text: text.into() });
        self
    }

    pub fn fact(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.push(CardElement::Fact { label: label.into(), value: value.into() });
        self
    }

    pub fn option(
        mut self,
        ordinal: usize,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        self.body.push(CardElement::Choice { ordinal, label: label.into(), detail: detail.into() });
        self
    }

    pub fn action(mut self, action_id: impl Into<String>, label: impl Into<String>) -> Self {
        self.body.push(CardElement::Action { action_id: action_id.into(), label: label.into() });
        self
    }

    pub fn build(self) -> Card {
        Card { id: self.id, title: self.title, body: self.body }
    }
}

pub fn overview_card(set: &SelectionSet, page: usize) -> Card {
    let mut builder = CardBuilder::new(CardKind::Overview, "Nearby options");
    for (index, entry) in set.page(page).iter().enumerate() {
        let detail = match entry {
            SelectionEntry::Place(candidate) => place_detail(candidate),
            SelectionEntry::Group { members, .. } => format!("{} locations", members.len()),
        };
        builder = builder.option(index + 1, entry.label(), detail);
    }

    if set.page_count() > 1 {
        builder = builder.text(format!("Page {} of {}", page + 1, set.page_count()));
    }
    if set.has_page_after(page) {
        builder = builder.action("selection.more", "More options");
    }
    builder.action("selection.none", "None of these").build()
}

/// `Details` when the place can be called, `DetailsNoCall` otherwise.
pub fn details_card(candidate: &Candidate) -> Card {
    let kind = if candidate.has_phone() { CardKind::Details } else { CardKind::DetailsNoCall };
    let mut builder = CardBuilder::new(kind, candidate.name.clone())
        .fact("Address", candidate.address.clone());

    if let Some(category) = &candidate.category {
        builder = builder.fact("Category", category.clone());
    }
    if let Some(distance) = candidate.distance_meters {
        builder = builder.fact("Distance", format_distance(distance));
    }

    builder = builder.action("details.directions", "Show directions");
    if let Some(phone) = candidate.phone.as_ref().filter(|_| candidate.has_phone()) {
        builder = builder.fact("Phone", phone.clone()).action("details.call", "Call");
    }
    builder.build()
}

pub fn route_card(destination: &Candidate, route: &RouteOption, ordinal: usize) -> Card {
    let mut builder = CardBuilder::new(CardKind::Route, format!("Route to {}", destination.name))
        .option(ordinal, route.summary.clone(), format!("{} min", route.duration_minutes()))
        .fact("Distance", route.distance_label());

    for step in &route.steps {
        builder = builder.text(step.clone());
    }
    builder.action("route.start_navigation", "Start navigation").build()
}

fn place_detail(candidate: &Candidate) -> String {
    match candidate.distance_meters {
        Some(distance) => format!("{} · {}", candidate.address, format_distance(distance)),
        None => candidate.address.clone(),
    }
}

fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{} m", meters.round() as u64)
    } else {
        format!("{:.1} km", meters / 1_000.0)
    }
}
