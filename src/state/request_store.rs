use crate::api::{ApiClient, ApiError, ApiErrorKind};
use crate::cache::{ListingCache, RequestPatch};
use crate::models::{RequestPage, SongRequest};
use crate::util::{now_iso, today_key_iso};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Server-side page size for the listing endpoint.
pub(crate) const PAGE_LIMIT: u32 = 10;

/// Requester shown for a locally synthesized insert until the server's row
/// replaces it at reconciliation.
const OPTIMISTIC_REQUESTER: &str = "系統";

/// Owns the paginated listing cache and runs the optimistic mutation
/// protocol against it.
///
/// Every mutation applies its local edit first, then issues the request, and
/// on settlement, success or failure alike, invalidates the cache. There is
/// deliberately no rollback path: a failed optimistic edit is corrected by the
/// refetch, not by inverse-applying the edit. Mutations may overlap freely;
/// each one invalidates independently and the refetch epoch decides which
/// response still matters.
#[derive(Clone, Copy)]
pub(crate) struct RequestStore {
    api_client: RwSignal<ApiClient>,

    cache: RwSignal<ListingCache>,

    /// Initial load in flight (nothing cached yet).
    pub is_loading: RwSignal<bool>,
    /// Next-page fetch in flight. Single-flight: `load_next_page` refuses to
    /// stack a second one.
    pub is_fetching: RwSignal<bool>,
    pub has_more: RwSignal<bool>,

    /// Terminal error of the most recent fetch. Not retried automatically.
    pub error: RwSignal<Option<String>>,
    /// Settle failure of the most recent mutation. The optimistic edit is
    /// kept; the settle-time refetch restores server truth.
    pub mutation_error: RwSignal<Option<String>>,

    /// Cache marked for wholesale replacement; a refetch is in flight.
    stale: RwSignal<bool>,
    /// Bumped on every invalidation. Responses compare their epoch before
    /// committing, so a late page or refetch is simply superseded.
    epoch: RwSignal<u64>,
}

/// Settle failures surface to the operator; the two expected refusals get a
/// readable message instead of the raw HTTP text.
fn friendly_mutation_error(e: ApiError) -> String {
    match e.kind {
        ApiErrorKind::Unauthorized => "API key 無效或未設定".to_string(),
        ApiErrorKind::Rejected => "目前未開放點歌".to_string(),
        _ => e.to_string(),
    }
}

/// Decide whether a next-page response may still commit. A response that
/// started at `my_epoch` commits only while no invalidation has bumped the
/// store past it; otherwise it is dropped, the refetch already covers its
/// range. Returns the appended cache and the new `has_more`.
fn settle_appended_page(
    cache: &ListingCache,
    current_epoch: u64,
    my_epoch: u64,
    page: RequestPage,
) -> Option<(ListingCache, bool)> {
    if current_epoch != my_epoch {
        return None;
    }
    let has_more = page.cursor.is_some();
    Some((cache.append_page(page), has_more))
}

/// Same decision for a wholesale replacement: the refetch commits only if its
/// invalidation is still the latest one.
fn settle_refetched_pages(
    current_epoch: u64,
    my_epoch: u64,
    pages: Vec<RequestPage>,
) -> Option<(ListingCache, bool)> {
    if current_epoch != my_epoch {
        return None;
    }
    let has_more = pages.last().is_some_and(|p| p.cursor.is_some());
    Some((ListingCache::from_pages(pages), has_more))
}

/// Build the transient client-side row for an optimistic insert. The v4 UUID
/// cannot collide with server ids; server truth supersedes the row at the
/// next reconciliation.
pub(crate) fn synthesize_request(title: &str) -> SongRequest {
    let now = now_iso();
    SongRequest {
        id: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        requester: OPTIMISTIC_REQUESTER.to_string(),
        done: false,
        key: today_key_iso(),
        created_at: now.clone(),
        updated_at: now,
    }
}

impl RequestStore {
    pub fn new(api_client: RwSignal<ApiClient>) -> Self {
        Self {
            api_client,
            cache: RwSignal::new(ListingCache::default()),
            is_loading: RwSignal::new(false),
            is_fetching: RwSignal::new(false),
            has_more: RwSignal::new(true),
            error: RwSignal::new(None),
            mutation_error: RwSignal::new(None),
            stale: RwSignal::new(false),
            epoch: RwSignal::new(0),
        }
    }

    /// Reactive snapshot of the cache. The snapshot is immutable; the signal
    /// swaps it atomically, so readers never see a half-applied mutation.
    pub fn snapshot(&self) -> ListingCache {
        self.cache.get()
    }

    fn commit(&self, cache: ListingCache) {
        self.cache.set(cache);
    }

    /// First page load on mount.
    pub fn load_initial(&self) {
        if self.is_loading.get_untracked() || !self.cache.get_untracked().is_empty() {
            return;
        }

        self.is_loading.set(true);
        self.error.set(None);

        let store = *self;
        let api_client = self.api_client.get_untracked();
        let my_epoch = self.epoch.get_untracked();
        spawn_local(async move {
            match api_client.list_requests(None, PAGE_LIMIT).await {
                Ok(page) => {
                    if let Some((cache, has_more)) = settle_refetched_pages(
                        store.epoch.get_untracked(),
                        my_epoch,
                        vec![page],
                    ) {
                        store.has_more.set(has_more);
                        store.commit(cache);
                    }
                }
                Err(e) => {
                    store.error.set(Some(e.to_string()));
                }
            }
            store.is_loading.set(false);
        });
    }

    /// Fetch the page after the last cached one. At most one in flight; a
    /// failure surfaces on `error` and the trigger has to fire again.
    pub fn load_next_page(&self) {
        if self.is_loading.get_untracked()
            || self.is_fetching.get_untracked()
            || !self.has_more.get_untracked()
        {
            return;
        }

        let Some(cursor) = self.cache.get_untracked().next_cursor() else {
            self.has_more.set(false);
            return;
        };

        self.is_fetching.set(true);
        self.error.set(None);

        let store = *self;
        let api_client = self.api_client.get_untracked();
        let my_epoch = self.epoch.get_untracked();
        spawn_local(async move {
            match api_client.list_requests(Some(&cursor), PAGE_LIMIT).await {
                Ok(page) => {
                    if let Some((cache, has_more)) = settle_appended_page(
                        &store.cache.get_untracked(),
                        store.epoch.get_untracked(),
                        my_epoch,
                        page,
                    ) {
                        store.has_more.set(has_more);
                        store.commit(cache);
                    }
                }
                Err(e) => {
                    store.error.set(Some(e.to_string()));
                }
            }
            store.is_fetching.set(false);
        });
    }

    /// Mark the cache stale and replace it from the server, walking cursors
    /// from the start down to the previously loaded depth so the scroll
    /// position survives. Idempotent while a refetch is pending.
    pub fn invalidate(&self) {
        if self.stale.get_untracked() {
            return;
        }

        self.stale.set(true);
        let my_epoch = self.epoch.get_untracked() + 1;
        self.epoch.set(my_epoch);

        let depth = self.cache.get_untracked().page_count().max(1);
        let store = *self;
        let api_client = self.api_client.get_untracked();
        spawn_local(async move {
            let mut pages: Vec<RequestPage> = Vec::with_capacity(depth);
            let mut cursor: Option<String> = None;

            loop {
                match api_client
                    .list_requests(cursor.as_deref(), PAGE_LIMIT)
                    .await
                {
                    Ok(page) => {
                        cursor = page.cursor.clone();
                        pages.push(page);
                        if cursor.is_none() || pages.len() >= depth {
                            break;
                        }
                    }
                    Err(e) => {
                        // Terminal for this refetch; clearing `stale` lets the
                        // next mutation settle trigger a fresh one.
                        store.error.set(Some(e.to_string()));
                        store.stale.set(false);
                        return;
                    }
                }
            }

            if let Some((cache, has_more)) =
                settle_refetched_pages(store.epoch.get_untracked(), my_epoch, pages)
            {
                store.has_more.set(has_more);
                store.error.set(None);
                store.commit(cache);
                store.stale.set(false);
            }
        });
    }

    /// Optimistic insert: the synthesized row lands in the first page before
    /// any network round trip.
    pub fn insert(&self, title: String) {
        let item = synthesize_request(&title);
        self.commit(self.cache.get_untracked().insert_front(item));

        let store = *self;
        let api_client = self.api_client.get_untracked();
        spawn_local(async move {
            if let Err(e) = api_client.create_request(&title).await {
                store.mutation_error.set(Some(friendly_mutation_error(e)));
            }
            store.invalidate();
        });
    }

    /// Optimistic done-flag update, visible before the PATCH settles.
    pub fn set_done(&self, id: String, done: bool) {
        let mut patch = RequestPatch::done(done);
        patch.updated_at = Some(now_iso());
        self.commit(self.cache.get_untracked().replace_item(&id, &patch));

        let store = *self;
        let api_client = self.api_client.get_untracked();
        spawn_local(async move {
            if let Err(e) = api_client.update_request(&id, done).await {
                store.mutation_error.set(Some(friendly_mutation_error(e)));
            }
            store.invalidate();
        });
    }

    /// Optimistic removal.
    pub fn remove(&self, id: String) {
        self.commit(self.cache.get_untracked().remove_item(&id));

        let store = *self;
        let api_client = self.api_client.get_untracked();
        spawn_local(async move {
            if let Err(e) = api_client.delete_request(&id).await {
                store.mutation_error.set(Some(friendly_mutation_error(e)));
            }
            store.invalidate();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ListingCache;
    use crate::util::test_support::request;
    use crate::util::{local_day_key, today_key_iso};

    #[test]
    fn test_current_page_response_appends() {
        let cache = ListingCache::from_pages(vec![RequestPage {
            cursor: Some("c1".to_string()),
            data: vec![request("a", "2024-05-02T00:00:00.000Z", "2024-05-02T10:00:00.000Z")],
        }]);
        let page = RequestPage {
            cursor: None,
            data: vec![request("b", "2024-05-01T00:00:00.000Z", "2024-05-01T10:00:00.000Z")],
        };

        let (appended, has_more) = settle_appended_page(&cache, 0, 0, page).unwrap();
        assert_eq!(appended.page_count(), 2);
        assert!(!has_more);
        assert_eq!(appended.locate("b"), Some((1, 0)));
    }

    #[test]
    fn test_response_after_invalidation_is_superseded() {
        // A next-page fetch starts at epoch 0, a mutation settles and bumps
        // the epoch to 1, then both responses arrive. The stale append is
        // dropped; the refetch replaces the cache wholesale.
        let cache = ListingCache::from_pages(vec![RequestPage {
            cursor: Some("c1".to_string()),
            data: vec![request("a", "2024-05-02T00:00:00.000Z", "2024-05-02T10:00:00.000Z")],
        }]);
        let late_page = RequestPage {
            cursor: Some("c2".to_string()),
            data: vec![request("b", "2024-05-01T00:00:00.000Z", "2024-05-01T10:00:00.000Z")],
        };

        assert!(settle_appended_page(&cache, 1, 0, late_page).is_none());

        let refetched = vec![RequestPage {
            cursor: None,
            data: vec![
                request("a", "2024-05-02T00:00:00.000Z", "2024-05-02T10:00:00.000Z"),
                request("c", "2024-05-02T00:00:00.000Z", "2024-05-02T11:00:00.000Z"),
            ],
        }];
        let (fresh, has_more) = settle_refetched_pages(1, 1, refetched).unwrap();
        assert_eq!(fresh.page_count(), 1);
        assert!(!has_more);
        assert!(fresh.locate("b").is_none());
        assert_eq!(fresh.locate("c"), Some((0, 1)));
    }

    #[test]
    fn test_stale_refetch_loses_to_a_newer_invalidation() {
        let pages = vec![RequestPage {
            cursor: None,
            data: vec![request("a", "2024-05-02T00:00:00.000Z", "2024-05-02T10:00:00.000Z")],
        }];
        assert!(settle_refetched_pages(2, 1, pages).is_none());
    }

    #[test]
    fn test_friendly_mutation_errors() {
        let unauthorized = ApiError {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(friendly_mutation_error(unauthorized), "API key 無效或未設定");

        let rejected = ApiError {
            kind: ApiErrorKind::Rejected,
            message: "not accepting".to_string(),
        };
        assert_eq!(friendly_mutation_error(rejected), "目前未開放點歌");

        let http = ApiError {
            kind: ApiErrorKind::Http,
            message: "Updating request failed (500): boom".to_string(),
        };
        assert_eq!(
            friendly_mutation_error(http),
            "Updating request failed (500): boom"
        );
    }

    #[test]
    fn test_synthesized_request_defaults() {
        let r = synthesize_request("Song A");
        assert_eq!(r.title, "Song A");
        assert_eq!(r.requester, OPTIMISTIC_REQUESTER);
        assert!(!r.done);
        assert_eq!(r.key, today_key_iso());
        assert_eq!(r.created_at, r.updated_at);
    }

    #[test]
    fn test_synthesized_ids_do_not_collide() {
        let a = synthesize_request("a");
        let b = synthesize_request("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_optimistic_insert_is_locatable_before_settle() {
        // The cache half of `insert`: the row is findable immediately, well
        // before any network response could have arrived.
        let r = synthesize_request("Song A");
        let id = r.id.clone();
        let cache = ListingCache::default().insert_front(r);
        assert_eq!(cache.locate(&id), Some((0, 0)));
        assert_eq!(
            local_day_key(&cache.get(&id).unwrap().key),
            local_day_key(&today_key_iso())
        );
    }
}
