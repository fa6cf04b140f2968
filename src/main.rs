use std::{process, sync::Arc, time::Duration};

use murmur::{
    application::{
        error::AppError,
        feed::FeedService,
        posts::PostService,
        profile::ProfileService,
        relations::RelationService,
        repos::{EdgesRepo, FeedRepo, PostsWriteRepo, ProfilesRepo, UsersRepo},
        revalidate::{NoopRevalidator, ProfileRevalidator},
    },
    config::{self, StoreBackend},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        memory::InMemoryStore,
        revalidate::WebhookRevalidator,
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_postgres(&settings).await?;
    repositories.health_check().await.map_err(InfraError::from)?;
    info!(target = "murmur::migrate", "migrations applied");
    Ok(())
}

async fn init_postgres(settings: &config::Settings) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::Migration(err.to_string()))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_revalidator(settings: &config::Settings) -> Result<Arc<dyn ProfileRevalidator>, AppError> {
    match settings.revalidate.webhook_url.as_ref() {
        Some(url) => {
            let webhook = WebhookRevalidator::new(url.clone(), settings.revalidate.timeout)?;
            Ok(Arc::new(webhook))
        }
        None => Ok(Arc::new(NoopRevalidator)),
    }
}

struct Stores {
    feed: Arc<dyn FeedRepo>,
    posts: Arc<dyn PostsWriteRepo>,
    users: Arc<dyn UsersRepo>,
    profiles: Arc<dyn ProfilesRepo>,
    edges: Arc<dyn EdgesRepo>,
    db: Option<Arc<PostgresRepositories>>,
}

impl Stores {
    fn postgres(repositories: Arc<PostgresRepositories>) -> Self {
        Self {
            feed: repositories.clone(),
            posts: repositories.clone(),
            users: repositories.clone(),
            profiles: repositories.clone(),
            edges: repositories.clone(),
            db: Some(repositories),
        }
    }

    fn memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            feed: store.clone(),
            posts: store.clone(),
            users: store.clone(),
            profiles: store.clone(),
            edges: store,
            db: None,
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let stores = match settings.store {
        StoreBackend::Postgres => Stores::postgres(init_postgres(&settings).await?),
        StoreBackend::Memory => {
            warn!(
                target = "murmur::serve",
                "using the in-memory store; data is lost on shutdown"
            );
            Stores::memory(Arc::new(InMemoryStore::new()))
        }
    };
    let revalidator = build_revalidator(&settings)?;

    let state = HttpState {
        feed: Arc::new(FeedService::new(stores.feed, settings.feed)),
        posts: Arc::new(PostService::new(
            stores.posts,
            stores.users,
            revalidator.clone(),
        )),
        relations: Arc::new(RelationService::new(stores.edges, revalidator)),
        profiles: Arc::new(ProfileService::new(stores.profiles)),
        db: stores.db,
    };

    serve_http(&settings, state).await
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "murmur::serve",
        addr = %settings.server.addr,
        store = ?settings.store,
        "listening"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        },
    );

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        () = drain_deadline(signalled_rx, grace) => {
            warn!(
                target = "murmur::serve",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn drain_deadline(signalled: oneshot::Receiver<()>, grace: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "murmur::serve", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "murmur::serve", "shutdown signal received");
}
