mod config;
mod constants;
mod domain;
mod logging;
mod routes;
mod services;

use axum::Router;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use config::Config;
use constants::RATE_LIMIT_IDLE_SECS;
use services::github::GitHubContents;
use services::link_store::LinkStore;
use services::objkt::ObjktClient;
use services::opensea::OpenSeaClient;
use services::rate_limit::UpstreamRateLimiter;
use services::resolver::CollectionResolver;
use services::upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    pub resolver: CollectionResolver,
    pub objkt: ObjktClient,
    pub nft_contract: String,
    pub links: LinkStore,
    pub ping_message: String,
    pub limiter: Arc<UpstreamRateLimiter>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        // Shared by every client; buckets are keyed by host
        let limiter = Arc::new(UpstreamRateLimiter::default());
        let upstream = Upstream::new(config.upstream.clone(), limiter.clone())?;

        let opensea = OpenSeaClient::new(
            upstream.clone(),
            &config.opensea_api_base,
            config.opensea_api_key.clone(),
        );
        let objkt = ObjktClient::new(upstream.clone(), &config.objkt_api_base, &config.ipfs_gateway);
        let resolver = CollectionResolver::new(
            opensea,
            objkt.clone(),
            upstream.clone(),
            config.page_hosts.clone(),
        );
        let links = LinkStore::new(GitHubContents::new(upstream, config.github.clone()));

        Ok(Self {
            resolver,
            objkt,
            nft_contract: config.nft_contract.clone(),
            links,
            ping_message: config.ping_message.clone(),
            limiter,
        })
    }
}

/// The full application router. With `spa_dir` set, non-API paths serve the
/// built single-page app and fall back to its `index.html`.
pub fn app(state: Arc<AppState>, spa_dir: Option<&Path>) -> Router {
    let mut router = routes::build_routes();

    if let Some(dir) = spa_dir {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).fallback(index));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down gracefully"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down gracefully"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = Config::from_env()?;

    if config.github.token.is_none() {
        tracing::warn!("GITHUB_TOKEN is not set; /api/save-link will fail");
    }
    if let Some(dir) = &config.spa_dist_dir {
        tracing::info!(dir = %dir.display(), "serving single-page app");
    }

    let state = Arc::new(AppState::from_config(&config)?);

    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let idle = Duration::from_secs(RATE_LIMIT_IDLE_SECS);
        let mut interval = tokio::time::interval(idle);
        loop {
            interval.tick().await;
            limiter.cleanup(idle);
        }
    });
    let app = app(state, config.spa_dist_dir.as_deref());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
