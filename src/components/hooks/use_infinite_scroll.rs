use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;

/// Distance from the content bottom, in CSS pixels, at which the next page
/// is requested.
const LOAD_MORE_THRESHOLD: f64 = 150.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScrollGeometry {
    pub viewport_height: f64,
    pub scroll_y: f64,
    pub content_height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FetchFlags {
    pub is_loading: bool,
    pub is_fetching: bool,
    pub has_more: bool,
    /// The most recent fetch ended in an error. Geometry-driven triggers stay
    /// parked until a scroll event clears it.
    pub fetch_failed: bool,
}

/// Scroll-event trigger: within the threshold of the bottom, nothing already
/// in flight, more pages available. Deliberately ignores `fetch_failed`: a
/// fresh qualifying scroll is the user action that retries after an error.
pub(crate) fn should_load_on_scroll(g: ScrollGeometry, f: FetchFlags) -> bool {
    (g.viewport_height + g.scroll_y).ceil() >= g.content_height - LOAD_MORE_THRESHOLD
        && !f.is_fetching
        && f.has_more
}

/// Composition-time trigger: the content does not fill the viewport yet, so
/// no scroll event will ever come. Re-checked after every successful page
/// load; a failed fetch parks it, since firing on unchanged geometry would
/// hammer a failing server.
pub(crate) fn should_auto_fill(g: ScrollGeometry, f: FetchFlags) -> bool {
    g.content_height <= g.viewport_height
        && f.has_more
        && !f.is_loading
        && !f.is_fetching
        && !f.fetch_failed
}

/// Boundary safeguard for the scroll trigger: scroll position at or past the
/// exact content bottom. Parked after a failed fetch, like auto-fill.
pub(crate) fn reached_exact_bottom(g: ScrollGeometry, f: FetchFlags) -> bool {
    (g.viewport_height + g.scroll_y).ceil() >= g.content_height
        && f.has_more
        && !f.is_fetching
        && !f.is_loading
        && !f.fetch_failed
}

pub(crate) struct UseInfiniteScroll {
    pub is_loading: Signal<bool>,
    pub is_fetching: Signal<bool>,
    pub has_more: Signal<bool>,
    pub fetch_failed: Signal<bool>,
    pub on_load_more: Callback<()>,
}

fn window_geometry() -> Option<ScrollGeometry> {
    let win = web_sys::window()?;
    let doc_el = win.document()?.document_element()?;
    Some(ScrollGeometry {
        viewport_height: win.inner_height().ok()?.as_f64()?,
        scroll_y: win.scroll_y().ok()?,
        content_height: doc_el.scroll_height() as f64,
    })
}

/// Drive `on_load_more` from window scroll and viewport geometry.
///
/// The single-flight guarantee comes from the `is_fetching` flag: the store
/// flips it before the fetch starts, so a second qualifying scroll event
/// cannot re-fire until the first page load settles.
pub(crate) fn use_infinite_scroll(options: UseInfiniteScroll) {
    let UseInfiniteScroll {
        is_loading,
        is_fetching,
        has_more,
        fetch_failed,
        on_load_more,
    } = options;

    let flags_untracked = move || FetchFlags {
        is_loading: is_loading.get_untracked(),
        is_fetching: is_fetching.get_untracked(),
        has_more: has_more.get_untracked(),
        fetch_failed: fetch_failed.get_untracked(),
    };

    let handle = window_event_listener(ev::scroll, move |_ev: web_sys::Event| {
        if let Some(g) = window_geometry() {
            if should_load_on_scroll(g, flags_untracked()) {
                on_load_more.run(());
            }
        }
    });
    on_cleanup(move || handle.remove());

    let flags_tracked = move || FetchFlags {
        is_loading: is_loading.get(),
        is_fetching: is_fetching.get(),
        has_more: has_more.get(),
        fetch_failed: fetch_failed.get(),
    };

    // Auto-fill: runs on composition and again whenever a fetch settles or
    // `has_more` flips, until the content overflows the viewport. A settle
    // that failed reruns this effect too, with the same geometry; the
    // `fetch_failed` guard keeps that rerun from looping against the server.
    Effect::new(move |_| {
        let f = flags_tracked();
        if let Some(g) = window_geometry() {
            if should_auto_fill(g, f) {
                on_load_more.run(());
            }
        }
    });

    // Exact-bottom safeguard: a viewport that ends precisely at the content
    // bottom produces no scroll event either.
    Effect::new(move |_| {
        let f = flags_tracked();
        if let Some(g) = window_geometry() {
            if reached_exact_bottom(g, f) && !should_auto_fill(g, f) {
                on_load_more.run(());
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> FetchFlags {
        FetchFlags {
            is_loading: false,
            is_fetching: false,
            has_more: true,
            fetch_failed: false,
        }
    }

    #[test]
    fn test_scroll_within_threshold_fires() {
        // 600 + 260 = 860 >= 1000 - 150
        let g = ScrollGeometry {
            viewport_height: 600.0,
            scroll_y: 260.0,
            content_height: 1000.0,
        };
        assert!(should_load_on_scroll(g, idle()));
    }

    #[test]
    fn test_scroll_outside_threshold_does_not_fire() {
        let g = ScrollGeometry {
            viewport_height: 600.0,
            scroll_y: 200.0,
            content_height: 1000.0,
        };
        assert!(!should_load_on_scroll(g, idle()));
    }

    #[test]
    fn test_scroll_threshold_boundary_is_inclusive() {
        let g = ScrollGeometry {
            viewport_height: 600.0,
            scroll_y: 250.0,
            content_height: 1000.0,
        };
        assert!(should_load_on_scroll(g, idle()));
    }

    #[test]
    fn test_in_flight_fetch_blocks_refire() {
        // A second qualifying scroll event while the first fetch is still in
        // flight must not fire again.
        let g = ScrollGeometry {
            viewport_height: 600.0,
            scroll_y: 300.0,
            content_height: 1000.0,
        };
        assert!(should_load_on_scroll(g, idle()));
        let fetching = FetchFlags {
            is_fetching: true,
            ..idle()
        };
        assert!(!should_load_on_scroll(g, fetching));
    }

    #[test]
    fn test_no_more_pages_blocks_scroll_trigger() {
        let g = ScrollGeometry {
            viewport_height: 600.0,
            scroll_y: 400.0,
            content_height: 1000.0,
        };
        let exhausted = FetchFlags {
            has_more: false,
            ..idle()
        };
        assert!(!should_load_on_scroll(g, exhausted));
    }

    #[test]
    fn test_short_content_auto_fills_without_scroll() {
        let g = ScrollGeometry {
            viewport_height: 800.0,
            scroll_y: 0.0,
            content_height: 500.0,
        };
        assert!(should_auto_fill(g, idle()));
    }

    #[test]
    fn test_auto_fill_stops_once_content_overflows() {
        let g = ScrollGeometry {
            viewport_height: 800.0,
            scroll_y: 0.0,
            content_height: 801.0,
        };
        assert!(!should_auto_fill(g, idle()));
    }

    #[test]
    fn test_auto_fill_respects_all_guards() {
        let g = ScrollGeometry {
            viewport_height: 800.0,
            scroll_y: 0.0,
            content_height: 500.0,
        };
        for f in [
            FetchFlags {
                is_loading: true,
                ..idle()
            },
            FetchFlags {
                is_fetching: true,
                ..idle()
            },
            FetchFlags {
                has_more: false,
                ..idle()
            },
        ] {
            assert!(!should_auto_fill(g, f), "{f:?}");
        }
    }

    #[test]
    fn test_failed_fetch_parks_geometry_triggers() {
        // After a fetch error the geometry has not changed, so rerunning the
        // composition triggers would just refire the same doomed request.
        // They stay parked until the error is cleared.
        let short = ScrollGeometry {
            viewport_height: 800.0,
            scroll_y: 0.0,
            content_height: 500.0,
        };
        let bottom = ScrollGeometry {
            viewport_height: 600.0,
            scroll_y: 400.0,
            content_height: 1000.0,
        };
        let failed = FetchFlags {
            fetch_failed: true,
            ..idle()
        };
        assert!(!should_auto_fill(short, failed));
        assert!(!reached_exact_bottom(bottom, failed));
    }

    #[test]
    fn test_scroll_event_retries_after_failed_fetch() {
        // A fresh qualifying scroll is the user action that retries; the
        // store clears the error when the new fetch starts.
        let g = ScrollGeometry {
            viewport_height: 600.0,
            scroll_y: 300.0,
            content_height: 1000.0,
        };
        let failed = FetchFlags {
            fetch_failed: true,
            ..idle()
        };
        assert!(should_load_on_scroll(g, failed));
    }

    #[test]
    fn test_exact_bottom_safeguard() {
        let g = ScrollGeometry {
            viewport_height: 600.0,
            scroll_y: 400.0,
            content_height: 1000.0,
        };
        assert!(reached_exact_bottom(g, idle()));

        let above = ScrollGeometry {
            scroll_y: 399.0,
            ..g
        };
        assert!(!reached_exact_bottom(above, idle()));
    }
}
