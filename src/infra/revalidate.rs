//! Webhook-backed profile revalidation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::application::revalidate::{ProfileRevalidator, RevalidateError};
use crate::domain::types::UserId;

use super::error::InfraError;

#[derive(Debug, Serialize)]
struct RevalidateBody<'a> {
    path: &'a str,
}

/// Asks the page renderer to rebuild `/profiles/{id}` by POSTing the path to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookRevalidator {
    client: Client,
    endpoint: Url,
}

impl WebhookRevalidator {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("murmur/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn profile_path(user: &UserId) -> String {
        format!("/profiles/{user}")
    }
}

#[async_trait]
impl ProfileRevalidator for WebhookRevalidator {
    async fn revalidate(&self, user: &UserId) -> Result<(), RevalidateError> {
        let path = Self::profile_path(user);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&RevalidateBody { path: &path })
            .send()
            .await
            .map_err(|err| RevalidateError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RevalidateError::Status(status.as_u16()));
        }
        Ok(())
    }
}
