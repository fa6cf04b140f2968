use async_trait::async_trait;
use sqlx::QueryBuilder;

use crate::application::repos::{FeedQuery, FeedRepo, RepoError};
use crate::domain::entities::FeedEntry;

use super::PostgresRepositories;
use super::types::FeedRow;
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl FeedRepo for PostgresRepositories {
    async fn scan_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, RepoError> {
        let mut qb = QueryBuilder::new(
            "SELECT p.id, p.user_id AS author_id, u.name AS author_name, \
             u.image AS author_avatar, p.content, p.created_at, \
             (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count, ",
        );

        match query.viewer.as_ref() {
            Some(viewer) => {
                qb.push(
                    "EXISTS (SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ",
                );
                qb.push_bind(viewer.as_str());
                qb.push(") AS liked_by_me ");
            }
            None => {
                qb.push("FALSE AS liked_by_me ");
            }
        }

        qb.push("FROM posts p INNER JOIN users u ON u.id = p.user_id WHERE 1=1 ");
        Self::apply_feed_scope(&mut qb, &query.scope);

        if let Some(cursor) = query.after.as_ref() {
            qb.push(" AND (p.created_at, p.id) < (");
            qb.push_bind(cursor.created_at());
            qb.push(", ");
            qb.push_bind(cursor.id().as_str());
            qb.push(")");
        }

        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(query.take));

        let rows = qb
            .build_query_as::<FeedRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(FeedEntry::try_from).collect()
    }
}
