//! Cricket Score Back binary entrypoint wiring REST, SSE, and the score store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cricket_score_back::{
    config::AppConfig,
    dao::score_store::ScoreStore,
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());
    tokio::spawn(storage_supervisor::forward_status(app_state.clone()));
    start_storage(app_state.clone()).await?;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Keep the MongoDB connection supervised in the background; the server starts degraded.
#[cfg(feature = "mongo-store")]
async fn start_storage(state: SharedState) -> anyhow::Result<()> {
    use cricket_score_back::dao::{
        score_store::mongodb::{MongoConfig, MongoScoreStore},
        storage::StorageError,
    };

    let config = MongoConfig::from_env()
        .await
        .context("reading MongoDB configuration")?;
    info!(database = %config.database_name, "using MongoDB score store");

    tokio::spawn(storage_supervisor::run(state, move || {
        let config = config.clone();
        async move {
            let store = MongoScoreStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn ScoreStore>)
        }
    }));
    Ok(())
}

/// Install the in-memory store right away.
#[cfg(not(feature = "mongo-store"))]
async fn start_storage(state: SharedState) -> anyhow::Result<()> {
    use cricket_score_back::{dao::score_store::MemoryScoreStore, services::match_service};

    let store: Arc<dyn ScoreStore> = Arc::new(MemoryScoreStore::new());
    match_service::seed_teams(&store, &state.config().teams)
        .await
        .context("seeding teams")?;
    state.install_score_store(store).await;
    info!("using in-memory score store");
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
