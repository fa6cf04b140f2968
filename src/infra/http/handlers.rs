use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::application::feed::FeedRequest;
use crate::application::pagination::CursorPage;
use crate::domain::entities::{FeedEntry, ProfileRecord};
use crate::domain::types::{PostId, UserId};

use super::HttpState;
use super::caller::Caller;
use super::error::ApiError;
use super::models::{CreatePostRequest, FeedQueryParams, ToggleResponse};

pub async fn get_feed(
    State(state): State<HttpState>,
    caller: Caller,
    Query(query): Query<FeedQueryParams>,
) -> Result<Json<CursorPage<FeedEntry>>, ApiError> {
    let filter = query.feed_filter()?;

    let mut request = FeedRequest::new(filter)
        .with_cursor(query.cursor)
        .with_caller(caller.0);
    if let Some(limit) = query.limit {
        request = request.with_limit(limit);
    }

    let page = state.feed.fetch_page(request).await?;
    Ok(Json(page))
}

pub async fn create_post(
    State(state): State<HttpState>,
    caller: Caller,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<FeedEntry>), ApiError> {
    let entry = state
        .posts
        .create_post(caller.id(), &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn toggle_like(
    State(state): State<HttpState>,
    caller: Caller,
    Path(post_id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let outcome = state
        .relations
        .toggle_like(caller.id(), &PostId::new(post_id))
        .await?;
    Ok(Json(ToggleResponse {
        active: outcome.active,
    }))
}

pub async fn toggle_follow(
    State(state): State<HttpState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let outcome = state
        .relations
        .toggle_follow(caller.id(), &UserId::new(user_id))
        .await?;
    Ok(Json(ToggleResponse {
        active: outcome.active,
    }))
}

pub async fn get_profile(
    State(state): State<HttpState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileRecord>, ApiError> {
    let id = UserId::new(user_id);
    let profile = state
        .profiles
        .get_profile(&id, caller.id())
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found", Some(format!("no user `{id}`"))))?;
    Ok(Json(profile))
}

pub async fn health(State(state): State<HttpState>) -> Response {
    let Some(db) = state.db.as_ref() else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
