pub(crate) mod grouping;
pub(crate) mod listing;

pub(crate) use grouping::{group_by_day, DayGroup};
pub(crate) use listing::{ListingCache, RequestPatch};
