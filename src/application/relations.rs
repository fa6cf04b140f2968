//! Like and follow toggles.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::repos::{EdgesRepo, RepoError};
use crate::application::revalidate::{ProfileRevalidator, spawn_revalidation};
use crate::domain::entities::Edge;
use crate::domain::types::{EdgeState, PostId, UserId};

/// Result of a toggle, valid as of the moment it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub active: bool,
}

impl ToggleOutcome {
    pub fn state(self) -> EdgeState {
        EdgeState::from_active(self.active)
    }
}

impl From<EdgeState> for ToggleOutcome {
    fn from(state: EdgeState) -> Self {
        Self {
            active: state.is_active(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("a caller identity is required")]
    NotAuthenticated,
    #[error("{kind} target `{target}` does not exist")]
    NotFound { kind: &'static str, target: String },
    #[error("entity store unavailable: {0}")]
    StoreUnavailable(#[source] RepoError),
}

#[derive(Clone)]
pub struct RelationService {
    edges: Arc<dyn EdgesRepo>,
    revalidator: Arc<dyn ProfileRevalidator>,
}

impl RelationService {
    pub fn new(edges: Arc<dyn EdgesRepo>, revalidator: Arc<dyn ProfileRevalidator>) -> Self {
        Self { edges, revalidator }
    }

    pub async fn toggle_like(
        &self,
        caller: Option<&UserId>,
        post: &PostId,
    ) -> Result<ToggleOutcome, ToggleError> {
        let caller = caller.ok_or(ToggleError::NotAuthenticated)?;
        let edge = Edge::like(caller.clone(), post.clone());
        let state = self.flip(&edge).await?;
        Ok(state.into())
    }

    /// Toggle `caller → target` and revalidate both profiles in the background.
    pub async fn toggle_follow(
        &self,
        caller: Option<&UserId>,
        target: &UserId,
    ) -> Result<ToggleOutcome, ToggleError> {
        let caller = caller.ok_or(ToggleError::NotAuthenticated)?;
        let edge = Edge::follow(caller.clone(), target.clone());
        let state = self.flip(&edge).await?;

        spawn_revalidation(&self.revalidator, [target.clone(), caller.clone()]);

        Ok(state.into())
    }

    async fn flip(&self, edge: &Edge) -> Result<EdgeState, ToggleError> {
        let kind = edge.kind().as_str();
        let state = match self.edges.toggle_edge(edge).await {
            Ok(state) => state,
            // A concurrent toggle created the same edge first; the pair is now present.
            Err(RepoError::Duplicate { constraint }) => {
                debug!(
                    kind,
                    actor = %edge.actor(),
                    target = edge.target(),
                    constraint = %constraint,
                    "edge insert raced with a concurrent toggle"
                );
                EdgeState::Active
            }
            Err(RepoError::NotFound | RepoError::InvalidInput { .. }) => {
                return Err(ToggleError::NotFound {
                    kind,
                    target: edge.target().to_string(),
                });
            }
            Err(err) => return Err(ToggleError::StoreUnavailable(err)),
        };

        counter!("murmur_toggle_total", "kind" => kind, "state" => state.as_str()).increment(1);
        info!(
            kind,
            actor = %edge.actor(),
            target = edge.target(),
            state = state.as_str(),
            "edge toggled"
        );
        Ok(state)
    }
}
