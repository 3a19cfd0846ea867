use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, Coordinates, LocationQuery};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPurpose {
    Destination,
    Origin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    NotFound,
    UserDeclined,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SelectionState {
    AwaitingOrigin,
    Presenting { page: usize },
    Resolved(Candidate),
    Cancelled(CancelReason),
}

impl SelectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Cancelled(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AwaitingOrigin => "awaiting_origin",
            Self::Presenting { .. } => "presenting",
            Self::Resolved(_) => "resolved",
            Self::Cancelled(_) => "cancelled",
        }
    }
}

/// One selectable line of an overview. Branches of the same chain collapse
/// into a `Group` in category searches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SelectionEntry {
    Place(Candidate),
    Group { label: String, members: Vec<Candidate> },
}

impl SelectionEntry {
    pub fn label(&self) -> &str {
        match self {
            Self::Place(candidate) => &candidate.name,
            Self::Group { label, .. } => label,
        }
    }

    pub fn candidates(&self) -> Vec<&Candidate> {
        match self {
            Self::Place(candidate) => vec![candidate],
            Self::Group { members, .. } => members.iter().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionSet {
    query: LocationQuery,
    origin: Option<Coordinates>,
    entries: Vec<SelectionEntry>,
    page_size: usize,
}

impl SelectionSet {
    /// Builds a paged set, dropping repeated candidate ids (first occurrence
    /// wins) and optionally merging same-name candidates into groups.
    pub fn new(
        query: LocationQuery,
        origin: Option<Coordinates>,
        candidates: Vec<Candidate>,
        page_size: usize,
        merge_same_name: bool,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let unique = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.id.clone()))
            .collect::<Vec<_>>();

        let entries = if merge_same_name { merge_by_name(unique) } else { places(unique) };
        Self { query, origin, entries, page_size: page_size.max(1) }
    }

    pub fn empty(query: LocationQuery, origin: Option<Coordinates>, page_size: usize) -> Self {
        Self::new(query, origin, Vec::new(), page_size, false)
    }

    pub fn narrowed(&self, candidates: Vec<Candidate>) -> Self {
        Self::new(self.query.clone(), self.origin, candidates, self.page_size, false)
    }

    pub fn query(&self) -> &LocationQuery {
        &self.query
    }

    pub fn origin(&self) -> Option<Coordinates> {
        self.origin
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.entries.len().div_ceil(self.page_size)
    }

    pub fn page(&self, page: usize) -> &[SelectionEntry] {
        let start = page.saturating_mul(self.page_size).min(self.entries.len());
        let end = start.saturating_add(self.page_size).min(self.entries.len());
        &self.entries[start..end]
    }

    pub fn has_page_after(&self, page: usize) -> bool {
        page + 1 < self.page_count()
    }
}

fn places(candidates: Vec<Candidate>) -> Vec<SelectionEntry> {
    candidates.into_iter().map(SelectionEntry::Place).collect()
}

fn merge_by_name(candidates: Vec<Candidate>) -> Vec<SelectionEntry> {
    let mut groups: Vec<(String, Vec<Candidate>)> = Vec::new();
    for candidate in candidates {
        let key = normalize(&candidate.name);
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(candidate),
            None => groups.push((key, vec![candidate])),
        }
    }

    // A single group would just be the whole list again.
    if groups.len() == 1 {
        return places(groups.into_iter().flat_map(|(_, members)| members).collect());
    }

    groups
        .into_iter()
        .map(|(_, mut members)| {
            if members.len() == 1 {
                SelectionEntry::Place(members.remove(0))
            } else {
                let label = members[0].name.clone();
                SelectionEntry::Group { label, members }
            }
        })
        .collect()
}

pub(crate) fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            folded.extend(ch.to_lowercase());
        } else {
            folded.push(' ');
        }
    }
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A single disambiguation sub-dialog: the set being narrowed and where it is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Disambiguation {
    pub purpose: SelectionPurpose,
    pub set: SelectionSet,
    pub state: SelectionState,
}

impl Disambiguation {
    pub fn current_page(&self) -> Option<usize> {
        match self.state {
            SelectionState::Presenting { page } => Some(page),
            _ => None,
        }
    }

    pub fn resolved(&self) -> Option<&Candidate> {
        match &self.state {
            SelectionState::Resolved(candidate) => Some(candidate),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionEvent {
    /// 1-based position within the current page.
    Ordinal(usize),
    Name(String),
    NextPage,
    Decline,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionNotice {
    PresentPage,
    NarrowedToMatches { count: usize },
    AutoSelected,
    OrdinalOutOfRange { ordinal: usize },
    NoNameMatch { text: String },
    NoMoreOptions,
    NothingFound,
    Declined,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: SelectionState,
    pub event: SelectionEvent,
    pub next: Disambiguation,
    pub notices: Vec<SelectionNotice>,
}

impl TransitionOutcome {
    pub fn to(&self) -> &SelectionState {
        &self.next.state
    }
}
