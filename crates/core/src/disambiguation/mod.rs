pub mod engine;
pub mod states;

pub use engine::{DisambiguationEngine, SelectionTransitionError};
pub use states::{
    CancelReason, Disambiguation, SelectionEntry, SelectionEvent, SelectionNotice,
    SelectionPurpose, SelectionSet, SelectionState, TransitionOutcome,
};
