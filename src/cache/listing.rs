use crate::models::{RequestPage, SongRequest};
use crate::util::compare_requests;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// `(page_index, item_index)` of a request inside the cache.
pub(crate) type Location = (usize, usize);

/// Field-wise patch merged into a cached request by [`ListingCache::replace_item`].
#[derive(Clone, Debug, Default)]
pub(crate) struct RequestPatch {
    pub done: Option<bool>,
    pub title: Option<String>,
    pub requester: Option<String>,
    pub updated_at: Option<String>,
}

impl RequestPatch {
    pub(crate) fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }

    fn apply(&self, r: &mut SongRequest) {
        if let Some(done) = self.done {
            r.done = done;
        }
        if let Some(title) = &self.title {
            r.title = title.clone();
        }
        if let Some(requester) = &self.requester {
            r.requester = requester.clone();
        }
        if let Some(updated_at) = &self.updated_at {
            r.updated_at = updated_at.clone();
        }
    }
}

/// Client-held snapshot of the cursor-paginated listing.
///
/// Pages are kept in fetch order behind `Arc`, so every mutation rebuilds
/// only the outer vec and the one touched page. The id index is a derived
/// cache over the pages and is never authoritative; it is kept in step by
/// each operation and can always be recomputed from the pages alone.
///
/// All operations are pure: they return a new cache and leave `self` intact,
/// so readers holding an older snapshot never observe a partial update.
#[derive(Clone, Debug, Default)]
pub(crate) struct ListingCache {
    pages: Vec<Arc<RequestPage>>,
    index: HashMap<String, Location>,
}

impl ListingCache {
    /// Rebuild a cache from whole pages (used when refetched state replaces
    /// the previous snapshot wholesale).
    pub(crate) fn from_pages(pages: Vec<RequestPage>) -> Self {
        let pages: Vec<Arc<RequestPage>> = pages.into_iter().map(Arc::new).collect();
        let index = Self::build_index(&pages);
        Self { pages, index }
    }

    fn build_index(pages: &[Arc<RequestPage>]) -> HashMap<String, Location> {
        let mut index = HashMap::new();
        for (page_index, page) in pages.iter().enumerate() {
            for (item_index, r) in page.data.iter().enumerate() {
                index.insert(r.id.clone(), (page_index, item_index));
            }
        }
        index
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub(crate) fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[cfg(test)]
    pub(crate) fn pages(&self) -> impl Iterator<Item = &RequestPage> {
        self.pages.iter().map(|p| p.as_ref())
    }

    /// Cursor to request the page after the last fetched one.
    pub(crate) fn next_cursor(&self) -> Option<String> {
        self.pages.last().and_then(|p| p.cursor.clone())
    }

    pub(crate) fn locate(&self, id: &str) -> Option<Location> {
        self.index.get(id).copied()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: &str) -> Option<&SongRequest> {
        let (page_index, item_index) = self.locate(id)?;
        self.pages.get(page_index)?.data.get(item_index)
    }

    /// Append a freshly fetched page at the end.
    pub(crate) fn append_page(&self, page: RequestPage) -> Self {
        let mut pages = self.pages.clone();
        let mut index = self.index.clone();
        let page_index = pages.len();
        for (item_index, r) in page.data.iter().enumerate() {
            index.insert(r.id.clone(), (page_index, item_index));
        }
        pages.push(Arc::new(page));
        Self { pages, index }
    }

    /// Merge `patch` into the request with `id`. Unknown ids leave the cache
    /// unchanged; a concurrent delete may have raced the update.
    pub(crate) fn replace_item(&self, id: &str, patch: &RequestPatch) -> Self {
        let Some((page_index, item_index)) = self.locate(id) else {
            return self.clone();
        };

        let mut page = self.pages[page_index].as_ref().clone();
        patch.apply(&mut page.data[item_index]);

        let mut pages = self.pages.clone();
        pages[page_index] = Arc::new(page);
        Self {
            pages,
            index: self.index.clone(),
        }
    }

    /// Remove the request with `id` from its page. Unknown ids are a no-op.
    pub(crate) fn remove_item(&self, id: &str) -> Self {
        let Some((page_index, item_index)) = self.locate(id) else {
            return self.clone();
        };

        let mut page = self.pages[page_index].as_ref().clone();
        page.data.remove(item_index);

        let mut pages = self.pages.clone();
        pages[page_index] = Arc::new(page);

        // Entries after the removed item slide down one slot within the page.
        let mut index = self.index.clone();
        index.remove(id);
        for loc in index.values_mut() {
            if loc.0 == page_index && loc.1 > item_index {
                loc.1 -= 1;
            }
        }

        Self { pages, index }
    }

    /// Insert a new request into the first page at its comparator position.
    ///
    /// New requests always carry today's day bucket, so they belong to the
    /// most recent group; only the first page can be their home. With no
    /// pages yet, a single cursor-less page is synthesized.
    pub(crate) fn insert_front(&self, item: SongRequest) -> Self {
        if self.pages.is_empty() {
            return Self::from_pages(vec![RequestPage {
                cursor: None,
                data: vec![item],
            }]);
        }

        let mut first = self.pages[0].as_ref().clone();
        let pos = first
            .data
            .partition_point(|existing| compare_requests(&item, existing) == Ordering::Greater);
        first.data.insert(pos, item.clone());

        let mut index = self.index.clone();
        for loc in index.values_mut() {
            if loc.0 == 0 && loc.1 >= pos {
                loc.1 += 1;
            }
        }
        index.insert(item.id, (0, pos));

        let mut pages = self.pages.clone();
        pages[0] = Arc::new(first);
        Self { pages, index }
    }

    /// All cached requests in listing order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &SongRequest> {
        self.pages.iter().flat_map(|p| p.data.iter())
    }
}
