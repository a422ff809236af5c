pub mod matches;
pub mod store;

pub use matches::{EpsMatch, MatchStatus};
pub use store::{
    check_overlap, compact_matches, mask_overlaps, BoundedMatchStore, QueryMatches, StoreLimits,
};
