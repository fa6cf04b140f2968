use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::ServiceExt;

use murmur::application::feed::{FeedLimits, FeedService};
use murmur::application::posts::PostService;
use murmur::application::profile::ProfileService;
use murmur::application::relations::RelationService;
use murmur::application::revalidate::NoopRevalidator;
use murmur::domain::entities::{PostRecord, UserRecord};
use murmur::domain::types::{PostId, UserId};
use murmur::infra::http::{CALLER_HEADER, HttpState, build_router};
use murmur::infra::memory::InMemoryStore;

async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    for id in ["alice", "bob"] {
        store
            .seed_user(UserRecord {
                id: UserId::new(id),
                name: Some(id.to_string()),
                image: None,
            })
            .await;
    }
    for (id, author, ts) in [("p1", "bob", 30), ("p2", "bob", 20), ("p3", "alice", 10)] {
        store
            .seed_post(PostRecord {
                id: PostId::new(id),
                author_id: UserId::new(author),
                content: format!("content of {id}"),
                created_at: OffsetDateTime::from_unix_timestamp(ts).expect("timestamp"),
            })
            .await;
    }
    store
}

fn router(store: Arc<InMemoryStore>) -> Router {
    let revalidator = Arc::new(NoopRevalidator);
    build_router(HttpState {
        feed: Arc::new(FeedService::new(store.clone(), FeedLimits::default())),
        posts: Arc::new(PostService::new(
            store.clone(),
            store.clone(),
            revalidator.clone(),
        )),
        relations: Arc::new(RelationService::new(store.clone(), revalidator)),
        profiles: Arc::new(ProfileService::new(store)),
        db: None,
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn item_ids(page: &Value) -> Vec<String> {
    page["entries"]
        .as_array()
        .expect("entries array")
        .iter()
        .map(|item| item["id"].as_str().expect("id").to_string())
        .collect()
}

#[tokio::test]
async fn health_is_no_content_without_a_database() {
    let app = router(seeded_store().await);
    let (status, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn feed_paginates_with_opaque_cursor() {
    let app = router(seeded_store().await);

    let (status, first) = send(&app, Method::GET, "/api/feed?limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&first), ["p1", "p2"]);
    let cursor = first["nextCursor"].as_str().expect("cursor").to_string();

    let (status, second) = send(
        &app,
        Method::GET,
        &format!("/api/feed?limit=2&cursor={cursor}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&second), ["p3"]);
    assert!(second["nextCursor"].is_null());
}

#[tokio::test]
async fn malformed_cursor_is_a_bad_request() {
    let app = router(seeded_store().await);
    let (status, body) = send(&app, Method::GET, "/api/feed?cursor=not-a-cursor", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_cursor");
}

#[tokio::test]
async fn author_filter_requires_author_parameter() {
    let app = router(seeded_store().await);

    let (status, body) = send(&app, Method::GET, "/api/feed?filter=author", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/feed?filter=author&author=alice",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_ids(&page), ["p3"]);
}

#[tokio::test]
async fn toggles_require_a_caller() {
    let app = router(seeded_store().await);
    let (status, body) = send(&app, Method::POST, "/api/posts/p1/like", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn like_toggle_flips_and_shows_in_feed() {
    let app = router(seeded_store().await);

    let (status, body) = send(&app, Method::POST, "/api/posts/p1/like", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "active": true }));

    let (_, page) = send(&app, Method::GET, "/api/feed?limit=1", Some("alice"), None).await;
    assert_eq!(page["entries"][0]["likeCount"], 1);
    assert_eq!(page["entries"][0]["likedByMe"], true);

    let (_, body) = send(&app, Method::POST, "/api/posts/p1/like", Some("alice"), None).await;
    assert_eq!(body, json!({ "active": false }));
}

#[tokio::test]
async fn liking_a_missing_post_is_not_found() {
    let app = router(seeded_store().await);
    let (status, body) =
        send(&app, Method::POST, "/api/posts/nope/like", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn follow_updates_profile_counts() {
    let app = router(seeded_store().await);

    let (status, body) =
        send(&app, Method::POST, "/api/users/bob/follow", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], true);

    let (status, profile) = send(&app, Method::GET, "/api/profiles/bob", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["followersCount"], 1);
    assert_eq!(profile["postsCount"], 2);
    assert_eq!(profile["isFollowing"], true);

    let (_, following) = send(
        &app,
        Method::GET,
        "/api/feed?filter=following",
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(item_ids(&following), ["p1", "p2"]);
}

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let app = router(seeded_store().await);
    let (status, _) = send(&app, Method::GET, "/api/profiles/ghost", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_post_validates_content() {
    let app = router(seeded_store().await);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/posts",
        Some("alice"),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_content");

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/posts",
        Some("alice"),
        Some(json!({ "content": "fresh thoughts" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["content"], "fresh thoughts");
    assert_eq!(created["authorId"], "alice");

    let (_, page) = send(&app, Method::GET, "/api/feed?limit=1", None, None).await;
    assert_eq!(item_ids(&page), [created["id"].as_str().expect("id").to_string()]);
}
