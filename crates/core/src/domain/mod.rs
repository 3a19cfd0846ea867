pub mod candidate;
pub mod origin;
pub mod query;
pub mod route;

pub use candidate::{Candidate, CandidateId, Coordinates};
pub use origin::Origin;
pub use query::{LocationQuery, Proximity, QueryTerm};
pub use route::RouteOption;
