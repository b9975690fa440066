//! # rusty-blog
//!
//! Assembles the adapters chosen by configuration and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{AppState, HttpSettings, Metrics};
use auth_adapters::{Argon2Hasher, JwtIssuer};
use configs::{Backend, LoggingSettings, MediaSettings, Settings};
use domains::{PostRepository, UserRepository};
use services::{CoverPolicy, CoverProcessor, PostService, UserService, UuidTokenSource};
use storage_adapters::{InMemoryStore, LocalMediaStorage, WebpTranscoder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.logging);

    let (posts, users) = repositories(&settings).await?;

    let media = &settings.media;
    tokio::fs::create_dir_all(&media.uploads_dir)
        .await
        .with_context(|| format!("creating {}", media.uploads_dir.display()))?;
    let storage = LocalMediaStorage::new(&media.covers_dir).await?;

    let metrics = Arc::new(Metrics::new());
    let covers = Arc::new(CoverProcessor::new(
        Arc::new(storage),
        Arc::new(WebpTranscoder::new()),
        Arc::new(UuidTokenSource),
        metrics.clone(),
        cover_policy(media),
    ));

    let tokens = JwtIssuer::new(&settings.auth.jwt_secret, settings.auth.token_ttl_hours);
    let state = AppState {
        posts: Arc::new(PostService::new(posts, covers, settings.slug.max_attempts)),
        users: Arc::new(UserService::new(
            users,
            Arc::new(Argon2Hasher::new()),
            Arc::new(tokens),
        )),
        metrics,
        http: Arc::new(HttpSettings {
            uploads_dir: media.uploads_dir.clone(),
            covers_dir: media.covers_dir.clone(),
            public_url: media.public_url.clone(),
            max_upload_bytes: media.max_upload_bytes,
            cors_origins: settings.server.cors_origins.clone(),
        }),
    };

    let addr = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, backend = ?settings.database.backend, "rusty-blog listening");

    axum::serve(listener, api_adapters::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("rusty-blog stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cover_policy(media: &MediaSettings) -> CoverPolicy {
    CoverPolicy {
        min_width: media.min_width,
        max_width: media.max_width,
        min_height: media.min_height,
        max_height: media.max_height,
        quality: media.quality,
    }
}

async fn repositories(
    settings: &Settings,
) -> anyhow::Result<(Arc<dyn PostRepository>, Arc<dyn UserRepository>)> {
    match settings.database.backend {
        Backend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            let store = Arc::new(InMemoryStore::new());
            let posts: Arc<dyn PostRepository> = store.clone();
            let users: Arc<dyn UserRepository> = store;
            Ok((posts, users))
        }
        #[cfg(feature = "db-postgres")]
        Backend::Postgres => {
            use secrecy::ExposeSecret;

            let pool = storage_adapters::postgres::connect(
                settings.database.url.expose_secret(),
                settings.database.max_connections,
            )
            .await?;
            let posts: Arc<dyn PostRepository> =
                Arc::new(storage_adapters::PgPostRepository::new(pool.clone()));
            let users: Arc<dyn UserRepository> =
                Arc::new(storage_adapters::PgUserRepository::new(pool));
            Ok((posts, users))
        }
        #[cfg(not(feature = "db-postgres"))]
        Backend::Postgres => anyhow::bail!("this build was compiled without the db-postgres feature"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
