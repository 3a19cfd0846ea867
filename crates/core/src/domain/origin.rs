use serde::{Deserialize, Serialize};

use crate::domain::candidate::{Candidate, Coordinates};

/// Where distances and routes are computed from. Sticky across turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Origin {
    Device(Coordinates),
    Address(Candidate),
}

impl Origin {
    pub fn coordinates(&self) -> Coordinates {
        match self {
            Self::Device(coordinates) => *coordinates,
            Self::Address(candidate) => candidate.coordinates,
        }
    }
}
