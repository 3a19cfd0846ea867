use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTerm {
    /// Any point of interest ("what's nearby").
    Anything,
    Category(String),
    /// A place name or free-text reference to a place.
    Text(String),
    /// A street address to geocode, used when fixing the origin.
    Address(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proximity {
    Anywhere,
    Nearby,
    Nearest,
    NearAddress(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery {
    pub term: QueryTerm,
    pub proximity: Proximity,
}

impl LocationQuery {
    pub fn new(term: QueryTerm, proximity: Proximity) -> Self {
        Self { term, proximity }
    }

    pub fn address(text: impl Into<String>) -> Self {
        Self::new(QueryTerm::Address(text.into()), Proximity::Anywhere)
    }

    /// Relative queries are meaningless without an origin.
    pub fn is_relative(&self) -> bool {
        matches!(self.proximity, Proximity::Nearby | Proximity::Nearest)
    }

    pub fn is_category(&self) -> bool {
        matches!(self.term, QueryTerm::Category(_))
    }

    pub fn is_empty(&self) -> bool {
        let blank_anchor =
            matches!(&self.proximity, Proximity::NearAddress(address) if address.trim().is_empty());
        let blank_term = match &self.term {
            QueryTerm::Anything => !self.is_relative(),
            QueryTerm::Category(text) | QueryTerm::Text(text) | QueryTerm::Address(text) => {
                text.trim().is_empty()
            }
        };
        blank_anchor || blank_term
    }

    pub fn describe(&self) -> String {
        let term = match &self.term {
            QueryTerm::Anything => "anything".to_string(),
            QueryTerm::Category(category) => format!("category:{category}"),
            QueryTerm::Text(text) => format!("text:{text}"),
            QueryTerm::Address(address) => format!("address:{address}"),
        };
        let proximity = match &self.proximity {
            Proximity::Anywhere => "anywhere".to_string(),
            Proximity::Nearby => "nearby".to_string(),
            Proximity::Nearest => "nearest".to_string(),
            Proximity::NearAddress(address) => format!("near:{address}"),
        };
        format!("{term}@{proximity}")
    }
}
