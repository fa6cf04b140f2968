//! Postgres-backed repository implementations.

mod edges;
mod feed;
mod posts;
mod profiles;
mod types;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{FeedScope, RepoError};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn apply_feed_scope<'q>(qb: &mut QueryBuilder<'q, Postgres>, scope: &'q FeedScope) {
        match scope {
            FeedScope::All => {}
            FeedScope::Author(author) => {
                qb.push(" AND p.user_id = ");
                qb.push_bind(author.as_str());
            }
            FeedScope::FollowedBy(follower) => {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM follows f WHERE f.followee_id = p.user_id AND f.follower_id = ",
                );
                qb.push_bind(follower.as_str());
                qb.push(")");
            }
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}
