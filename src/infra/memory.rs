//! In-process entity store.
//!
//! Backs the test suites and the `memory` store mode. Posts are kept in a
//! `BTreeMap` keyed by `(created_at, id)` so a feed scan is a reverse range
//! walk below the cursor, mirroring the composite index used in Postgres.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::application::repos::{
    CreatePostParams, EdgesRepo, FeedQuery, FeedRepo, FeedScope, PostsWriteRepo, ProfilesRepo,
    RepoError, UsersRepo,
};
use crate::domain::entities::{Edge, FeedEntry, PostRecord, ProfileRecord, UserRecord};
use crate::domain::types::{EdgeState, PostId, UserId};

type PostKey = (OffsetDateTime, PostId);

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserRecord>,
    posts: BTreeMap<PostKey, PostRecord>,
    post_keys: HashMap<PostId, PostKey>,
    likes: HashSet<(UserId, PostId)>,
    like_counts: HashMap<PostId, u64>,
    follows: HashSet<(UserId, UserId)>,
}

impl State {
    fn require_user(&self, id: &UserId) -> Result<(), RepoError> {
        if self.users.contains_key(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }

    fn insert_post(&mut self, post: PostRecord) -> Result<(), RepoError> {
        if self.post_keys.contains_key(&post.id) {
            return Err(RepoError::Duplicate {
                constraint: "posts_pkey".to_string(),
            });
        }
        let key = (post.created_at, post.id.clone());
        self.post_keys.insert(post.id.clone(), key.clone());
        self.posts.insert(key, post);
        Ok(())
    }

    fn flip(&mut self, edge: &Edge) -> Result<EdgeState, RepoError> {
        match edge {
            Edge::Like { user, post } => {
                self.require_user(user)?;
                if !self.post_keys.contains_key(post) {
                    return Err(RepoError::NotFound);
                }
                let pair = (user.clone(), post.clone());
                let count = self.like_counts.entry(post.clone()).or_default();
                if self.likes.remove(&pair) {
                    *count = count.saturating_sub(1);
                    Ok(EdgeState::Inactive)
                } else {
                    self.likes.insert(pair);
                    *count += 1;
                    Ok(EdgeState::Active)
                }
            }
            Edge::Follow { follower, followee } => {
                self.require_user(follower)?;
                self.require_user(followee)?;
                let pair = (follower.clone(), followee.clone());
                if self.follows.remove(&pair) {
                    Ok(EdgeState::Inactive)
                } else {
                    self.follows.insert(pair);
                    Ok(EdgeState::Active)
                }
            }
        }
    }

    fn matches(&self, scope: &FeedScope, post: &PostRecord) -> bool {
        match scope {
            FeedScope::All => true,
            FeedScope::Author(author) => &post.author_id == author,
            FeedScope::FollowedBy(follower) => self
                .follows
                .contains(&(follower.clone(), post.author_id.clone())),
        }
    }

    fn enrich(&self, post: &PostRecord, viewer: Option<&UserId>) -> FeedEntry {
        let author = self.users.get(&post.author_id);
        FeedEntry {
            id: post.id.clone(),
            author_id: post.author_id.clone(),
            author_name: author.and_then(|user| user.name.clone()),
            author_avatar: author.and_then(|user| user.image.clone()),
            content: post.content.clone(),
            created_at: post.created_at,
            like_count: self.like_counts.get(&post.id).copied().unwrap_or(0),
            liked_by_me: viewer.is_some_and(|viewer| {
                self.likes.contains(&(viewer.clone(), post.id.clone()))
            }),
        }
    }
}

#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<State>,
    available: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the connection to the store.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), RepoError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepoError::Timeout)
        }
    }

    pub async fn seed_user(&self, user: UserRecord) {
        self.state.write().await.users.insert(user.id.clone(), user);
    }

    /// Insert a post with an explicit timestamp; an existing id is left as is.
    pub async fn seed_post(&self, post: PostRecord) {
        let _ = self.state.write().await.insert_post(post);
    }

    /// Ensure an edge exists regardless of its current state.
    pub async fn seed_edge(&self, edge: Edge) {
        let mut state = self.state.write().await;
        if let Ok(EdgeState::Inactive) = state.flip(&edge) {
            let _ = state.flip(&edge);
        }
    }
}

#[async_trait]
impl FeedRepo for InMemoryStore {
    async fn scan_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, RepoError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        let take = query.take as usize;

        let rows: Box<dyn Iterator<Item = &PostRecord> + '_> = match &query.after {
            Some(cursor) => Box::new(
                state
                    .posts
                    .range(..(cursor.created_at(), cursor.id().clone()))
                    .rev()
                    .map(|(_, post)| post),
            ),
            None => Box::new(state.posts.values().rev()),
        };

        Ok(rows
            .filter(|post| state.matches(&query.scope, post))
            .take(take)
            .map(|post| state.enrich(post, query.viewer.as_ref()))
            .collect())
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.require_user(&params.author_id)?;
        let post = PostRecord {
            id: params.id,
            author_id: params.author_id,
            content: params.content,
            created_at: OffsetDateTime::now_utc(),
        };
        state.insert_post(post.clone())?;
        Ok(post)
    }
}

#[async_trait]
impl UsersRepo for InMemoryStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserRecord>, RepoError> {
        self.ensure_available()?;
        Ok(self.state.read().await.users.get(id).cloned())
    }
}

#[async_trait]
impl ProfilesRepo for InMemoryStore {
    async fn find_profile(
        &self,
        id: &UserId,
        viewer: Option<&UserId>,
    ) -> Result<Option<ProfileRecord>, RepoError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        let Some(user) = state.users.get(id) else {
            return Ok(None);
        };

        let followers_count = state.follows.iter().filter(|(_, to)| to == id).count();
        let follows_count = state.follows.iter().filter(|(from, _)| from == id).count();
        let posts_count = state
            .posts
            .values()
            .filter(|post| &post.author_id == id)
            .count();

        Ok(Some(ProfileRecord {
            id: user.id.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            followers_count: followers_count as u64,
            follows_count: follows_count as u64,
            posts_count: posts_count as u64,
            is_following: viewer
                .is_some_and(|viewer| state.follows.contains(&(viewer.clone(), id.clone()))),
        }))
    }
}

#[async_trait]
impl EdgesRepo for InMemoryStore {
    async fn toggle_edge(&self, edge: &Edge) -> Result<EdgeState, RepoError> {
        self.ensure_available()?;
        self.state.write().await.flip(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pagination::FeedCursor;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(seconds).expect("timestamp")
    }

    async fn store_with_posts() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .seed_user(UserRecord {
                id: UserId::from("u1"),
                name: None,
                image: None,
            })
            .await;
        for (id, ts) in [("b", 10), ("a", 10), ("c", 5)] {
            store
                .seed_post(PostRecord {
                    id: PostId::from(id),
                    author_id: UserId::from("u1"),
                    content: String::new(),
                    created_at: at(ts),
                })
                .await;
        }
        store
    }

    #[tokio::test]
    async fn scan_is_exclusive_of_the_cursor() {
        let store = store_with_posts().await;
        let rows = store
            .scan_feed(&FeedQuery {
                scope: FeedScope::All,
                after: Some(FeedCursor::new(at(10), PostId::from("b"))),
                take: 10,
                viewer: None,
            })
            .await
            .expect("scan");
        let ids: Vec<_> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test]
    async fn toggle_flips_edge_presence() {
        let store = store_with_posts().await;
        let edge = Edge::like(UserId::from("u1"), PostId::from("a"));

        assert_eq!(store.toggle_edge(&edge).await.ok(), Some(EdgeState::Active));
        assert_eq!(
            store.toggle_edge(&edge).await.ok(),
            Some(EdgeState::Inactive)
        );
    }

    #[tokio::test]
    async fn follow_requires_both_users() {
        let store = store_with_posts().await;
        let edge = Edge::follow(UserId::from("u1"), UserId::from("ghost"));
        assert!(matches!(
            store.toggle_edge(&edge).await,
            Err(RepoError::NotFound)
        ));
    }
}
