//! JSON-over-HTTP boundary for the feed, post, relationship and profile services.

mod caller;
mod error;
mod handlers;
mod middleware;
mod models;

pub use caller::{CALLER_HEADER, Caller};
pub use error::{ApiError, ApiErrorBody, ApiErrorMessage, codes};
pub use models::{CreatePostRequest, FeedQueryParams, ToggleResponse};

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::feed::FeedService;
use crate::application::posts::PostService;
use crate::application::profile::ProfileService;
use crate::application::relations::RelationService;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub relations: Arc<RelationService>,
    pub profiles: Arc<ProfileService>,
    /// Present when backed by Postgres; `/health` then probes the pool.
    pub db: Option<Arc<PostgresRepositories>>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/feed", get(handlers::get_feed))
        .route("/api/posts", post(handlers::create_post))
        .route("/api/posts/{id}/like", post(handlers::toggle_like))
        .route("/api/users/{id}/follow", post(handlers::toggle_follow))
        .route("/api/profiles/{id}", get(handlers::get_profile))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .with_state(state)
}
