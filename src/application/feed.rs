use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{CursorPage, FeedCursor, PaginationError};
use crate::application::repos::{FeedQuery, FeedRepo, FeedScope, RepoError};
use crate::domain::entities::FeedEntry;
use crate::domain::types::UserId;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Which posts a feed shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "author", rename_all = "snake_case")]
pub enum FeedFilter {
    All,
    /// Posts by authors the caller follows.
    FollowingOnly,
    ByAuthor(UserId),
}

impl FeedFilter {
    pub fn label(&self) -> &'static str {
        match self {
            FeedFilter::All => "all",
            FeedFilter::FollowingOnly => "following",
            FeedFilter::ByAuthor(_) => "author",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub filter: FeedFilter,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
    pub caller: Option<UserId>,
}

impl FeedRequest {
    pub fn new(filter: FeedFilter) -> Self {
        Self {
            filter,
            cursor: None,
            limit: None,
            caller: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_caller(mut self, caller: Option<UserId>) -> Self {
        self.caller = caller;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeedLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl FeedLimits {
    fn resolve(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed cursor: {0}")]
    MalformedCursor(#[from] PaginationError),
    #[error("entity store unavailable: {0}")]
    StoreUnavailable(#[source] RepoError),
}

impl From<RepoError> for FeedError {
    fn from(err: RepoError) -> Self {
        Self::StoreUnavailable(err)
    }
}

#[derive(Clone)]
pub struct FeedService {
    feed: Arc<dyn FeedRepo>,
    limits: FeedLimits,
}

impl FeedService {
    pub fn new(feed: Arc<dyn FeedRepo>, limits: FeedLimits) -> Self {
        Self { feed, limits }
    }

    /// Serve one page of a feed.
    ///
    /// Fetches `limit + 1` rows strictly after the cursor. A surplus row means
    /// more data exists; it is dropped and the last returned entry becomes
    /// the next cursor. `FollowingOnly` without a caller is always empty.
    pub async fn fetch_page(&self, request: FeedRequest) -> Result<CursorPage<FeedEntry>, FeedError> {
        let after = request
            .cursor
            .as_deref()
            .map(FeedCursor::decode)
            .transpose()?;

        let scope = match (&request.filter, request.caller.as_ref()) {
            (FeedFilter::All, _) => FeedScope::All,
            (FeedFilter::ByAuthor(author), _) => FeedScope::Author(author.clone()),
            (FeedFilter::FollowingOnly, Some(caller)) => FeedScope::FollowedBy(caller.clone()),
            (FeedFilter::FollowingOnly, None) => {
                debug!("following feed requested without a caller; serving empty page");
                return Ok(CursorPage::empty());
            }
        };

        let limit = self.limits.resolve(request.limit);
        let query = FeedQuery {
            scope,
            after,
            take: limit.saturating_add(1),
            viewer: request.caller,
        };

        let rows = self.feed.scan_feed(&query).await?;
        let page = paginate(rows, limit as usize);

        counter!("murmur_feed_pages_total", "filter" => request.filter.label()).increment(1);
        debug!(
            filter = request.filter.label(),
            returned = page.entries.len(),
            has_more = page.has_more(),
            "served feed page"
        );

        Ok(page)
    }
}

fn paginate(mut rows: Vec<FeedEntry>, limit: usize) -> CursorPage<FeedEntry> {
    let has_more = rows.len() > limit;
    rows.truncate(limit);

    let next_cursor = if has_more {
        rows.last()
            .map(|entry| FeedCursor::from_entry(entry).encode())
    } else {
        None
    };

    CursorPage::new(rows, next_cursor)
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::entities::{Edge, PostRecord, UserRecord};
    use crate::domain::types::PostId;
    use crate::infra::memory::InMemoryStore;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(seconds).expect("timestamp")
    }

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for id in ["u1", "u2", "u3"] {
            store.seed_user(UserRecord {
                id: UserId::from(id),
                name: Some(format!("user {id}")),
                image: None,
            })
            .await;
        }
        store
    }

    async fn seed_post(store: &InMemoryStore, id: &str, author: &str, created_at: i64) {
        store
            .seed_post(PostRecord {
                id: PostId::from(id),
                author_id: UserId::from(author),
                content: format!("post {id}"),
                created_at: at(created_at),
            })
            .await;
    }

    fn service(store: Arc<InMemoryStore>) -> FeedService {
        FeedService::new(store, FeedLimits::default())
    }

    fn ids(page: &CursorPage<FeedEntry>) -> Vec<&str> {
        page.entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[tokio::test]
    async fn ties_on_created_at_break_by_id_descending() {
        let store = seeded_store().await;
        seed_post(&store, "b", "u1", 10).await;
        seed_post(&store, "a", "u1", 10).await;
        seed_post(&store, "c", "u2", 5).await;
        let feed = service(store);

        let first = feed
            .fetch_page(FeedRequest::new(FeedFilter::All).with_limit(2))
            .await
            .expect("first page");
        assert_eq!(ids(&first), ["b", "a"]);

        let token = first.next_cursor.clone().expect("next cursor");
        let cursor = FeedCursor::decode(&token).expect("cursor decodes");
        assert_eq!(cursor.created_at(), at(10));
        assert_eq!(cursor.id(), &PostId::from("a"));

        let second = feed
            .fetch_page(
                FeedRequest::new(FeedFilter::All)
                    .with_limit(2)
                    .with_cursor(Some(token)),
            )
            .await
            .expect("second page");
        assert_eq!(ids(&second), ["c"]);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn exact_multiple_of_limit_ends_without_cursor() {
        let store = seeded_store().await;
        seed_post(&store, "p1", "u1", 1).await;
        seed_post(&store, "p2", "u1", 2).await;
        let feed = service(store);

        let page = feed
            .fetch_page(FeedRequest::new(FeedFilter::All).with_limit(2))
            .await
            .expect("page");
        assert_eq!(ids(&page), ["p2", "p1"]);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn default_limit_is_ten() {
        let store = seeded_store().await;
        for n in 0..15 {
            seed_post(&store, &format!("p{n:02}"), "u1", n).await;
        }
        let feed = service(store);

        let page = feed
            .fetch_page(FeedRequest::new(FeedFilter::All))
            .await
            .expect("page");
        assert_eq!(page.entries.len(), 10);
        assert!(page.has_more());
    }

    #[tokio::test]
    async fn limit_is_clamped_to_configured_bounds() {
        let store = seeded_store().await;
        for n in 0..5 {
            seed_post(&store, &format!("p{n}"), "u1", n).await;
        }
        let feed = FeedService::new(
            store,
            FeedLimits {
                default_page_size: 10,
                max_page_size: 3,
            },
        );

        let zero = feed
            .fetch_page(FeedRequest::new(FeedFilter::All).with_limit(0))
            .await
            .expect("page");
        assert_eq!(zero.entries.len(), 1);

        let huge = feed
            .fetch_page(FeedRequest::new(FeedFilter::All).with_limit(1_000))
            .await
            .expect("page");
        assert_eq!(huge.entries.len(), 3);
    }

    #[tokio::test]
    async fn following_feed_is_empty_for_anonymous_callers() {
        let store = seeded_store().await;
        seed_post(&store, "p1", "u1", 1).await;
        let feed = service(store);

        let page = feed
            .fetch_page(FeedRequest::new(FeedFilter::FollowingOnly))
            .await
            .expect("page");
        assert_eq!(page, CursorPage::empty());
    }

    #[tokio::test]
    async fn following_feed_only_shows_followed_authors() {
        let store = seeded_store().await;
        seed_post(&store, "p1", "u2", 1).await;
        seed_post(&store, "p2", "u3", 2).await;
        store
            .seed_edge(Edge::follow(UserId::from("u1"), UserId::from("u2")))
            .await;
        let feed = service(store);

        let page = feed
            .fetch_page(
                FeedRequest::new(FeedFilter::FollowingOnly).with_caller(Some(UserId::from("u1"))),
            )
            .await
            .expect("page");
        assert_eq!(ids(&page), ["p1"]);
    }

    #[tokio::test]
    async fn author_feed_filters_by_author() {
        let store = seeded_store().await;
        seed_post(&store, "p1", "u2", 1).await;
        seed_post(&store, "p2", "u3", 2).await;
        let feed = service(store);

        let page = feed
            .fetch_page(FeedRequest::new(FeedFilter::ByAuthor(UserId::from("u3"))))
            .await
            .expect("page");
        assert_eq!(ids(&page), ["p2"]);
        assert_eq!(page.entries[0].author_name.as_deref(), Some("user u3"));
    }

    #[tokio::test]
    async fn liked_by_me_requires_a_caller() {
        let store = seeded_store().await;
        seed_post(&store, "p1", "u2", 1).await;
        store
            .seed_edge(Edge::like(UserId::from("u1"), PostId::from("p1")))
            .await;
        let feed = service(store);

        let anonymous = feed
            .fetch_page(FeedRequest::new(FeedFilter::All))
            .await
            .expect("page");
        assert_eq!(anonymous.entries[0].like_count, 1);
        assert!(!anonymous.entries[0].liked_by_me);

        let viewer = feed
            .fetch_page(FeedRequest::new(FeedFilter::All).with_caller(Some(UserId::from("u1"))))
            .await
            .expect("page");
        assert!(viewer.entries[0].liked_by_me);

        let other = feed
            .fetch_page(FeedRequest::new(FeedFilter::All).with_caller(Some(UserId::from("u3"))))
            .await
            .expect("page");
        assert!(!other.entries[0].liked_by_me);
    }

    #[tokio::test]
    async fn malformed_cursor_is_a_hard_error() {
        let feed = service(seeded_store().await);

        let err = feed
            .fetch_page(FeedRequest::new(FeedFilter::All).with_cursor(Some("%%%".to_string())))
            .await
            .expect_err("cursor rejected");
        assert!(matches!(err, FeedError::MalformedCursor(_)));
    }

    #[tokio::test]
    async fn store_failures_surface_as_unavailable() {
        let store = seeded_store().await;
        store.set_available(false);
        let feed = service(store);

        let err = feed
            .fetch_page(FeedRequest::new(FeedFilter::All))
            .await
            .expect_err("store offline");
        assert!(matches!(err, FeedError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn inserts_between_fetches_do_not_shift_pages() {
        let store = seeded_store().await;
        for n in 0..6 {
            seed_post(&store, &format!("p{n}"), "u1", n).await;
        }
        let feed = service(store.clone());

        let first = feed
            .fetch_page(FeedRequest::new(FeedFilter::All).with_limit(3))
            .await
            .expect("first page");
        assert_eq!(ids(&first), ["p5", "p4", "p3"]);

        // Newer posts land at the head and must not leak into later pages.
        seed_post(&store, "n1", "u2", 100).await;
        seed_post(&store, "n2", "u3", 101).await;

        let second = feed
            .fetch_page(
                FeedRequest::new(FeedFilter::All)
                    .with_limit(3)
                    .with_cursor(first.next_cursor.clone()),
            )
            .await
            .expect("second page");
        assert_eq!(ids(&second), ["p2", "p1", "p0"]);
        assert!(second.next_cursor.is_none());
    }
}
