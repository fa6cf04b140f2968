use async_trait::async_trait;

use crate::application::repos::{EdgesRepo, RepoError};
use crate::domain::entities::Edge;
use crate::domain::types::EdgeState;

use super::PostgresRepositories;
use crate::infra::db::map_sqlx_error;

// One statement per relation: delete the pair if present, otherwise insert it.
// A losing concurrent insert surfaces as a unique violation on the primary key.
const TOGGLE_LIKE_SQL: &str = r#"
    WITH removed AS (
        DELETE FROM likes WHERE user_id = $1 AND post_id = $2
        RETURNING 1
    ), inserted AS (
        INSERT INTO likes (user_id, post_id)
        SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM removed)
        RETURNING 1
    )
    SELECT EXISTS (SELECT 1 FROM inserted)
"#;

const TOGGLE_FOLLOW_SQL: &str = r#"
    WITH removed AS (
        DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2
        RETURNING 1
    ), inserted AS (
        INSERT INTO follows (follower_id, followee_id)
        SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM removed)
        RETURNING 1
    )
    SELECT EXISTS (SELECT 1 FROM inserted)
"#;

#[async_trait]
impl EdgesRepo for PostgresRepositories {
    async fn toggle_edge(&self, edge: &Edge) -> Result<EdgeState, RepoError> {
        let (sql, left, right) = match edge {
            Edge::Like { user, post } => (TOGGLE_LIKE_SQL, user.as_str(), post.as_str()),
            Edge::Follow { follower, followee } => {
                (TOGGLE_FOLLOW_SQL, follower.as_str(), followee.as_str())
            }
        };

        let active = sqlx::query_scalar::<_, bool>(sql)
            .bind(left)
            .bind(right)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(EdgeState::from_active(active))
    }
}
