use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::feed::FeedError;
use crate::application::posts::PostError;
use crate::application::profile::ProfileError;
use crate::application::relations::ToggleError;

const REPORT_SOURCE: &str = "infra::http::api";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_CURSOR: &str = "invalid_cursor";
    pub const INVALID_CONTENT: &str = "invalid_content";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "caller identity required",
            Some("send the caller id in the x-user-id header".to_string()),
        )
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    /// Store failures keep their cause chain in the log report, not in the body.
    pub fn store_unavailable(err: &dyn StdError) -> Self {
        let status = StatusCode::SERVICE_UNAVAILABLE;
        Self {
            status,
            code: codes::STORE_UNAVAILABLE,
            message: "entity store unavailable",
            hint: None,
            report: Some(ErrorReport::from_error(REPORT_SOURCE, status, err)),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                REPORT_SOURCE,
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::MalformedCursor(inner) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_CURSOR,
                "invalid cursor",
                Some(inner.to_string()),
            ),
            FeedError::StoreUnavailable(_) => Self::store_unavailable(&err),
        }
    }
}

impl From<ToggleError> for ApiError {
    fn from(err: ToggleError) -> Self {
        match err {
            ToggleError::NotAuthenticated => Self::unauthorized(),
            ToggleError::NotFound { .. } => {
                Self::not_found("toggle target not found", Some(err.to_string()))
            }
            ToggleError::StoreUnavailable(_) => Self::store_unavailable(&err),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::NotAuthenticated => Self::unauthorized(),
            PostError::InvalidContent(inner) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_CONTENT,
                "invalid post content",
                Some(inner.to_string()),
            ),
            PostError::UnknownAuthor(_) => {
                Self::not_found("author not found", Some(err.to_string()))
            }
            PostError::StoreUnavailable(_) => Self::store_unavailable(&err),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        Self::store_unavailable(&err)
    }
}
