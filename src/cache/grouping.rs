use crate::cache::ListingCache;
use crate::models::SongRequest;
use crate::util::local_day_key;

/// One rendered day section: local calendar day plus its requests in listing
/// order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DayGroup {
    pub key: String,
    pub requests: Vec<SongRequest>,
}

/// Project the cache into day sections for the list view.
///
/// Pages are flattened in fetch order and bucketed by the local day of each
/// request's `key`. Buckets keep their first-seen order rather than being
/// re-sorted: the listing invariant (key desc, createdAt asc across pages)
/// already yields descending days.
pub(crate) fn group_by_day(cache: &ListingCache) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();

    for r in cache.iter() {
        let day = local_day_key(&r.key);
        match groups.iter_mut().find(|g| g.key == day) {
            Some(g) => g.requests.push(r.clone()),
            None => groups.push(DayGroup {
                key: day,
                requests: vec![r.clone()],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestPage;
    use crate::util::test_support::request;
    use crate::util::{now_iso, today_key_iso};

    fn cache_across_two_days() -> ListingCache {
        ListingCache::from_pages(vec![
            RequestPage {
                cursor: Some("b".to_string()),
                data: vec![
                    request("a", "2024-01-02T00:00:00.000Z", "2024-01-02T08:00:00.000Z"),
                    request("b", "2024-01-02T00:00:00.000Z", "2024-01-02T09:00:00.000Z"),
                ],
            },
            RequestPage {
                cursor: None,
                data: vec![request(
                    "c",
                    "2024-01-01T00:00:00.000Z",
                    "2024-01-01T07:00:00.000Z",
                )],
            },
        ])
    }

    #[test]
    fn test_groups_preserve_first_seen_order() {
        let groups = group_by_day(&cache_across_two_days());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].requests.len(), 2);
        assert_eq!(groups[0].requests[0].id, "a");
        assert_eq!(groups[0].requests[1].id, "b");
        assert_eq!(groups[1].requests[0].id, "c");
        // Day buckets come out newest-first because the listing does.
        assert!(groups[0].key > groups[1].key);
    }

    #[test]
    fn test_grouping_is_pure() {
        let cache = cache_across_two_days();
        assert_eq!(group_by_day(&cache), group_by_day(&cache));
    }

    #[test]
    fn test_empty_cache_has_no_groups() {
        assert!(group_by_day(&ListingCache::default()).is_empty());
    }

    #[test]
    fn test_single_insert_groups_under_today() {
        // Insert("Song A") on an empty cache: one page, one group keyed to
        // today, one undone item.
        let mut item = request("new", &today_key_iso(), &now_iso());
        item.title = "Song A".to_string();

        let cache = ListingCache::default().insert_front(item);
        let groups = group_by_day(&cache);

        assert_eq!(cache.page_count(), 1);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, local_day_key(&today_key_iso()));
        assert_eq!(groups[0].requests[0].title, "Song A");
        assert!(!groups[0].requests[0].done);
    }
}
