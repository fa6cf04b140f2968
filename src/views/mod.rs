//! Caller-held view cache.
//!
//! A caller keeps one paginated view per feed filter and one snapshot per
//! visited profile. After a confirmed write the matching `apply_*` method
//! brings every held view up to date without fetching anything.

pub mod patch;

use std::collections::HashMap;

use tracing::debug;

use crate::application::feed::FeedFilter;
use crate::application::pagination::CursorPage;
use crate::application::relations::ToggleOutcome;
use crate::domain::entities::{FeedEntry, ProfileRecord};
use crate::domain::types::{PostId, UserId};

pub use patch::{
    apply_delta, contains_post, patch_author, patch_followee, patch_follower, patch_like,
    prepend_entry,
};

/// Pages fetched so far for one feed filter, oldest fetch first.
pub type FeedView = Vec<CursorPage<FeedEntry>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewCache {
    feeds: HashMap<FeedFilter, FeedView>,
    profiles: HashMap<UserId, ProfileRecord>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly fetched page to the view for `filter`.
    pub fn record_page(&mut self, filter: FeedFilter, page: CursorPage<FeedEntry>) {
        self.feeds.entry(filter).or_default().push(page);
    }

    /// Drop a view, e.g. before refetching it from the start.
    pub fn reset_view(&mut self, filter: &FeedFilter) {
        self.feeds.remove(filter);
    }

    pub fn view(&self, filter: &FeedFilter) -> Option<&[CursorPage<FeedEntry>]> {
        self.feeds.get(filter).map(Vec::as_slice)
    }

    /// All held entries of a view in display order.
    pub fn entries(&self, filter: &FeedFilter) -> Vec<&FeedEntry> {
        self.feeds
            .get(filter)
            .map(|pages| pages.iter().flat_map(|page| page.entries.iter()).collect())
            .unwrap_or_default()
    }

    /// Cursor for the next fetch of a view; `None` when the view is complete
    /// or has never been fetched.
    pub fn next_cursor(&self, filter: &FeedFilter) -> Option<&str> {
        self.feeds
            .get(filter)
            .and_then(|pages| pages.last())
            .and_then(|page| page.next_cursor.as_deref())
    }

    pub fn record_profile(&mut self, profile: ProfileRecord) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn profile(&self, id: &UserId) -> Option<&ProfileRecord> {
        self.profiles.get(id)
    }

    /// Reflect a confirmed like toggle in every held feed view.
    pub fn apply_like(&mut self, post_id: &PostId, outcome: ToggleOutcome) {
        let delta = outcome.state().delta();
        let mut touched = 0usize;
        for pages in self.feeds.values_mut() {
            if !contains_post(pages, post_id) {
                continue;
            }
            *pages = patch_like(pages, post_id, delta, outcome.active);
            touched += 1;
        }
        debug!(post_id = %post_id, active = outcome.active, views = touched, "patched like state");
    }

    /// Reflect a confirmed follow toggle in the held profiles of both users.
    pub fn apply_follow(&mut self, caller: &UserId, target: &UserId, outcome: ToggleOutcome) {
        let delta = outcome.state().delta();
        if let Some(profile) = self.profiles.get_mut(target) {
            *profile = patch_followee(profile, delta, outcome.active);
        }
        if let Some(profile) = self.profiles.get_mut(caller) {
            *profile = patch_follower(profile, delta);
        }
    }

    /// Show a newly created post in the global view and its author's view.
    pub fn apply_created(&mut self, entry: &FeedEntry) {
        let targets = [
            FeedFilter::All,
            FeedFilter::ByAuthor(entry.author_id.clone()),
        ];
        for filter in &targets {
            if let Some(pages) = self.feeds.get_mut(filter) {
                *pages = prepend_entry(pages, entry);
            }
        }
        if let Some(profile) = self.profiles.get_mut(&entry.author_id) {
            *profile = patch_author(profile);
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn entry(id: &str, author: &str, likes: u64) -> FeedEntry {
        FeedEntry {
            id: PostId::from(id),
            author_id: UserId::from(author),
            author_name: None,
            author_avatar: None,
            content: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            like_count: likes,
            liked_by_me: false,
        }
    }

    fn profile(id: &str) -> ProfileRecord {
        ProfileRecord {
            id: UserId::from(id),
            name: None,
            image: None,
            followers_count: 3,
            follows_count: 1,
            posts_count: 2,
            is_following: false,
        }
    }

    fn populated() -> ViewCache {
        let mut cache = ViewCache::new();
        cache.record_page(
            FeedFilter::All,
            CursorPage::new(
                vec![entry("p1", "u2", 3), entry("p2", "u3", 0)],
                Some("next".to_string()),
            ),
        );
        cache.record_page(
            FeedFilter::All,
            CursorPage::new(vec![entry("p3", "u2", 1)], None),
        );
        cache.record_page(
            FeedFilter::ByAuthor(UserId::from("u2")),
            CursorPage::new(vec![entry("p1", "u2", 3), entry("p3", "u2", 1)], None),
        );
        cache.record_page(
            FeedFilter::FollowingOnly,
            CursorPage::new(vec![entry("p2", "u3", 0)], None),
        );
        cache
    }

    #[test]
    fn like_updates_every_view_holding_the_post() {
        let mut cache = populated();
        let untouched = cache.view(&FeedFilter::FollowingOnly).map(<[_]>::to_vec);

        cache.apply_like(&PostId::from("p1"), ToggleOutcome { active: true });

        for filter in [FeedFilter::All, FeedFilter::ByAuthor(UserId::from("u2"))] {
            let p1 = cache
                .entries(&filter)
                .into_iter()
                .find(|e| e.id == PostId::from("p1"))
                .expect("p1 held");
            assert_eq!(p1.like_count, 4);
            assert!(p1.liked_by_me);
        }
        assert_eq!(
            cache.view(&FeedFilter::FollowingOnly).map(<[_]>::to_vec),
            untouched
        );
    }

    fn patch_views_in_order(order: &[FeedFilter], post: &PostId) -> ViewCache {
        let mut cache = populated();
        for filter in order {
            let held = cache.view(filter).map(<[_]>::to_vec).unwrap_or_default();
            cache.reset_view(filter);
            for page in patch_like(&held, post, 1, true) {
                cache.record_page(filter.clone(), page);
            }
        }
        cache
    }

    #[test]
    fn view_application_order_does_not_matter() {
        let post = PostId::from("p1");
        let all = FeedFilter::All;
        let author = FeedFilter::ByAuthor(UserId::from("u2"));

        let forward = patch_views_in_order(&[all.clone(), author.clone()], &post);
        let reverse = patch_views_in_order(&[author, all], &post);
        assert_eq!(forward, reverse);
        assert_ne!(forward, populated());

        let mut whole = populated();
        whole.apply_like(&post, ToggleOutcome { active: true });
        assert_eq!(forward, whole);
    }

    #[test]
    fn next_cursor_comes_from_the_last_page() {
        let mut cache = populated();
        assert_eq!(cache.next_cursor(&FeedFilter::All), None);
        cache.reset_view(&FeedFilter::All);
        cache.record_page(
            FeedFilter::All,
            CursorPage::new(vec![entry("p1", "u2", 3)], Some("c".to_string())),
        );
        assert_eq!(cache.next_cursor(&FeedFilter::All), Some("c"));
        assert_eq!(cache.entries(&FeedFilter::All).len(), 1);
    }

    #[test]
    fn follow_patches_both_profiles() {
        let mut cache = populated();
        cache.record_profile(profile("u1"));
        cache.record_profile(profile("u2"));

        cache.apply_follow(
            &UserId::from("u1"),
            &UserId::from("u2"),
            ToggleOutcome { active: true },
        );

        let target = cache.profile(&UserId::from("u2")).expect("target held");
        assert_eq!(target.followers_count, 4);
        assert!(target.is_following);
        let caller = cache.profile(&UserId::from("u1")).expect("caller held");
        assert_eq!(caller.follows_count, 2);
    }

    #[test]
    fn created_post_lands_in_global_and_author_views() {
        let mut cache = populated();
        cache.record_profile(profile("u2"));

        cache.apply_created(&entry("p9", "u2", 0));

        assert_eq!(cache.entries(&FeedFilter::All)[0].id, PostId::from("p9"));
        assert_eq!(
            cache.entries(&FeedFilter::ByAuthor(UserId::from("u2")))[0].id,
            PostId::from("p9")
        );
        assert_eq!(cache.entries(&FeedFilter::FollowingOnly).len(), 1);
        assert_eq!(
            cache.profile(&UserId::from("u2")).map(|p| p.posts_count),
            Some(3)
        );
    }
}
