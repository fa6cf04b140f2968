//! Hook for re-materializing statically cached profile pages.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::types::UserId;

#[derive(Debug, Error)]
pub enum RevalidateError {
    #[error("revalidation request failed: {0}")]
    Request(String),
    #[error("revalidation endpoint answered with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait ProfileRevalidator: Send + Sync {
    async fn revalidate(&self, user: &UserId) -> Result<(), RevalidateError>;
}

/// Revalidator for deployments without static profile pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRevalidator;

#[async_trait]
impl ProfileRevalidator for NoopRevalidator {
    async fn revalidate(&self, _user: &UserId) -> Result<(), RevalidateError> {
        Ok(())
    }
}

/// Fire-and-forget revalidation of each distinct user.
///
/// Runs detached from the caller; failures are logged and counted, never
/// returned.
pub fn spawn_revalidation(
    revalidator: &Arc<dyn ProfileRevalidator>,
    users: impl IntoIterator<Item = UserId>,
) {
    let users: BTreeSet<UserId> = users.into_iter().collect();
    for user in users {
        let revalidator = Arc::clone(revalidator);
        tokio::spawn(async move {
            match revalidator.revalidate(&user).await {
                Ok(()) => debug!(user_id = %user, "profile revalidated"),
                Err(err) => {
                    counter!("murmur_revalidate_failures_total").increment(1);
                    warn!(user_id = %user, error = %err, "profile revalidation failed");
                }
            }
        });
    }
}
