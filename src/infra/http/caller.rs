use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::types::UserId;

use super::error::ApiError;

pub const CALLER_HEADER: &str = "x-user-id";

/// Identity asserted by the upstream session layer; absent for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    pub fn id(&self) -> Option<&UserId> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(CALLER_HEADER) else {
            return Ok(Self(None));
        };

        let value = value.to_str().map_err(|err| {
            ApiError::bad_request("invalid caller header", Some(err.to_string()))
        })?;
        let trimmed = value.trim();

        Ok(Self((!trimmed.is_empty()).then(|| UserId::new(trimmed))))
    }
}
