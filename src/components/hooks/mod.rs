pub(crate) mod use_infinite_scroll;

pub(crate) use use_infinite_scroll::{use_infinite_scroll, UseInfiniteScroll};
