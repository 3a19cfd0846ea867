use thiserror::Error;

use crate::disambiguation::states::{
    normalize, CancelReason, Disambiguation, SelectionEntry, SelectionEvent, SelectionNotice,
    SelectionPurpose, SelectionSet, SelectionState, TransitionOutcome,
};
use crate::domain::{Candidate, Coordinates, LocationQuery};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionTransitionError {
    #[error("selection already finished in state `{state}`; start a new selection")]
    Finished { state: &'static str },
    #[error("selection is waiting for an origin and cannot take event {event:?}")]
    AwaitingOrigin { event: SelectionEvent },
}

#[derive(Clone, Debug)]
pub struct DisambiguationEngine {
    page_size: usize,
}

impl Default for DisambiguationEngine {
    fn default() -> Self {
        Self::new(5)
    }
}

impl DisambiguationEngine {
    pub fn new(page_size: usize) -> Self {
        Self { page_size: page_size.max(1) }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Parks a query until an origin is known.
    pub fn await_origin(&self, query: LocationQuery) -> Disambiguation {
        Disambiguation {
            purpose: SelectionPurpose::Destination,
            set: SelectionSet::empty(query, None, self.page_size),
            state: SelectionState::AwaitingOrigin,
        }
    }

    /// Entry point once the resolver has produced candidates.
    pub fn begin(
        &self,
        purpose: SelectionPurpose,
        query: LocationQuery,
        origin: Option<Coordinates>,
        candidates: Vec<Candidate>,
    ) -> (Disambiguation, Vec<SelectionNotice>) {
        let merge = purpose == SelectionPurpose::Destination && query.is_category();
        let set = SelectionSet::new(query, origin, candidates, self.page_size, merge);

        let (state, notice) = match set.entries() {
            [] => {
                (SelectionState::Cancelled(CancelReason::NotFound), SelectionNotice::NothingFound)
            }
            [SelectionEntry::Place(only)] => {
                (SelectionState::Resolved(only.clone()), SelectionNotice::AutoSelected)
            }
            _ => (SelectionState::Presenting { page: 0 }, SelectionNotice::PresentPage),
        };

        (Disambiguation { purpose, set, state }, vec![notice])
    }

    pub fn apply(
        &self,
        current: &Disambiguation,
        event: &SelectionEvent,
    ) -> Result<TransitionOutcome, SelectionTransitionError> {
        let page = match &current.state {
            SelectionState::Presenting { page } => *page,
            SelectionState::AwaitingOrigin => {
                return Err(SelectionTransitionError::AwaitingOrigin { event: event.clone() });
            }
            terminal => {
                return Err(SelectionTransitionError::Finished { state: terminal.label() });
            }
        };

        let (next, notices) = match event {
            SelectionEvent::Ordinal(ordinal) => select_ordinal(current, page, *ordinal),
            SelectionEvent::Name(text) => select_name(current, text),
            SelectionEvent::NextPage => {
                if current.set.has_page_after(page) {
                    (
                        with_state(current, SelectionState::Presenting { page: page + 1 }),
                        vec![SelectionNotice::PresentPage],
                    )
                } else {
                    (current.clone(), vec![SelectionNotice::NoMoreOptions])
                }
            }
            SelectionEvent::Decline => (
                with_state(current, SelectionState::Cancelled(CancelReason::UserDeclined)),
                vec![SelectionNotice::Declined],
            ),
        };

        Ok(TransitionOutcome { from: current.state.clone(), event: event.clone(), next, notices })
    }
}

fn with_state(current: &Disambiguation, state: SelectionState) -> Disambiguation {
    Disambiguation { purpose: current.purpose, set: current.set.clone(), state }
}

fn select_ordinal(
    current: &Disambiguation,
    page: usize,
    ordinal: usize,
) -> (Disambiguation, Vec<SelectionNotice>) {
    let entries = current.set.page(page);
    let Some(entry) = ordinal.checked_sub(1).and_then(|index| entries.get(index)) else {
        return (current.clone(), vec![SelectionNotice::OrdinalOutOfRange { ordinal }]);
    };

    match entry {
        SelectionEntry::Place(candidate) => (
            with_state(current, SelectionState::Resolved(candidate.clone())),
            Vec::new(),
        ),
        SelectionEntry::Group { members, .. } => narrow(current, members.clone()),
    }
}

fn select_name(current: &Disambiguation, text: &str) -> (Disambiguation, Vec<SelectionNotice>) {
    let needle = normalize(text);
    if needle.is_empty() {
        return (current.clone(), vec![SelectionNotice::NoNameMatch { text: text.to_owned() }]);
    }

    let candidates =
        current.set.entries().iter().flat_map(SelectionEntry::candidates).collect::<Vec<_>>();

    let exact = candidates
        .iter()
        .filter(|candidate| normalize(&candidate.name) == needle)
        .collect::<Vec<_>>();
    let matches = if !exact.is_empty() {
        exact
    } else {
        let by_name = candidates
            .iter()
            .filter(|candidate| normalize(&candidate.name).contains(&needle))
            .collect::<Vec<_>>();
        if by_name.is_empty() {
            candidates
                .iter()
                .filter(|candidate| normalize(&candidate.address).contains(&needle))
                .collect()
        } else {
            by_name
        }
    };

    match matches.as_slice() {
        [] => (current.clone(), vec![SelectionNotice::NoNameMatch { text: text.to_owned() }]),
        [only] => (with_state(current, SelectionState::Resolved((**only).clone())), Vec::new()),
        many => narrow(current, many.iter().map(|candidate| (**candidate).clone()).collect()),
    }
}

fn narrow(
    current: &Disambiguation,
    candidates: Vec<Candidate>,
) -> (Disambiguation, Vec<SelectionNotice>) {
    let count = candidates.len();
    let next = Disambiguation {
        purpose: current.purpose,
        set: current.set.narrowed(candidates),
        state: SelectionState::Presenting { page: 0 },
    };
    (next, vec![SelectionNotice::NarrowedToMatches { count }])
}
