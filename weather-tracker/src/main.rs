use common::http_client::HttpClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use weather_tracker::api_client::WeatherApiClient;
use weather_tracker::config::Config;
use weather_tracker::handlers::{self, AppState};
use weather_tracker::{CacheStore, WeatherCatalog, WeatherCoordinator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    common::tracing::init(config.log_format);

    if config.weather_api_key.is_empty() {
        warn!("WEATHER_API_KEY is not set, forecast requests will be rejected");
    }

    let cancellation_token = CancellationToken::new();

    let cache = CacheStore::with_ttl(config.cache_dir.clone(), config.cache_ttl_seconds);
    if config.clear_cache_on_start {
        info!(dir = %config.cache_dir.display(), "Clearing forecast cache on startup...");
        cache.clear_all().await;
    }

    let http_client = HttpClient::new(config.http_timeout_seconds, config.http_max_retries)?;
    let api_client = WeatherApiClient::new(
        http_client,
        config.weather_api_url.clone(),
        config.weather_api_key.clone(),
    );
    let coordinator = Arc::new(WeatherCoordinator::new(
        cache,
        api_client,
        Arc::new(WeatherCatalog::new()),
        cancellation_token.clone(),
    ));

    let mut failures = coordinator.subscribe_failures();
    tokio::spawn(async move {
        while let Ok(failure) = failures.recv().await {
            warn!(
                query = %failure.query,
                unreachable = failure.unreachable,
                "Weather update failed: {}",
                failure.message
            );
        }
    });

    let app = handlers::router(AppState {
        coordinator: coordinator.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Weather tracker starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancellation_token))
        .await?;

    coordinator.shutdown().await;
    info!("Weather tracker stopped");
    Ok(())
}

async fn shutdown_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    // Cancel all in-flight refreshes
    cancellation_token.cancel();
    warn!("Cancelled in-flight refreshes, shutting down gracefully...");
}
