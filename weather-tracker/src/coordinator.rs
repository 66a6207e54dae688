use common::errors::AppError;
use common::models::ForecastResponse;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, instrument, warn};

use crate::api_client::WeatherApiClient;
use crate::cache::{CacheStore, ClearReport};
use crate::catalog::{WeatherCatalog, WeatherSnapshot};
use crate::location::{LocationBasis, LocationRequest};
use crate::refresh::should_fetch;

const FAILURE_CHANNEL_CAPACITY: usize = 64;

/// Where a refreshed snapshot came from
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Cached(WeatherSnapshot),
    Fetched(WeatherSnapshot),
}

impl RefreshOutcome {
    pub fn snapshot(&self) -> &WeatherSnapshot {
        match self {
            RefreshOutcome::Cached(s) | RefreshOutcome::Fetched(s) => s,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, RefreshOutcome::Fetched(_))
    }
}

/// A failed fetch, published for whoever surfaces errors to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub query: String,
    pub message: String,
    pub unreachable: bool,
}

pub struct WeatherCoordinator {
    cache: CacheStore,
    api_client: WeatherApiClient,
    catalog: Arc<WeatherCatalog>,
    failures: broadcast::Sender<FetchFailure>,
    cancellation_token: CancellationToken,
    tasks: TaskTracker,
}

impl WeatherCoordinator {
    pub fn new(
        cache: CacheStore,
        api_client: WeatherApiClient,
        catalog: Arc<WeatherCatalog>,
        cancellation_token: CancellationToken,
    ) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            cache,
            api_client,
            catalog,
            failures,
            cancellation_token,
            tasks: TaskTracker::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<WeatherCatalog> {
        &self.catalog
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn subscribe_failures(&self) -> broadcast::Receiver<FetchFailure> {
        self.failures.subscribe()
    }

    /// Run [`refresh`](Self::refresh) as an independent task. The handle
    /// may be dropped; failures are also published to
    /// [`subscribe_failures`](Self::subscribe_failures).
    pub fn fetch_weather_for_location(
        self: &Arc<Self>,
        request: LocationRequest,
        force_reload: bool,
    ) -> JoinHandle<Result<RefreshOutcome, AppError>> {
        let coordinator = Arc::clone(self);
        let cancel = self.cancellation_token.clone();

        self.tasks.spawn(
            async move {
                if cancel.is_cancelled() {
                    return Err(AppError::cancelled("Coordinator is shutting down"));
                }

                tokio::select! {
                    result = coordinator.refresh(&request, force_reload) => result,
                    _ = cancel.cancelled() => {
                        debug!(query = %request.query_string(), "Refresh cancelled");
                        Err(AppError::cancelled("Coordinator is shutting down"))
                    }
                }
            }
            .in_current_span(),
        )
    }

    /// A coordinate delivery from the device location provider. Always
    /// bypasses the cache.
    pub fn on_location_update(
        self: &Arc<Self>,
        latitude: f64,
        longitude: f64,
    ) -> JoinHandle<Result<RefreshOutcome, AppError>> {
        self.fetch_weather_for_location(LocationRequest::lat_long(latitude, longitude), true)
    }

    pub fn remove_location(&self, name: &str) -> bool {
        self.catalog.remove_by_display_name(name)
    }

    pub async fn clear_cache(&self) -> ClearReport {
        self.cache.clear_all().await
    }

    /// Serve the cached document for `request` when it is usable and no
    /// reload is forced; otherwise fetch, write the cache, then update the
    /// catalog. Failures leave both cache and catalog untouched, and every
    /// returned error is also published to the failure channel.
    #[instrument(
        skip(self, request),
        fields(cache_key = %request.cache_key(), query = %request.query_string())
    )]
    pub async fn refresh(
        &self,
        request: &LocationRequest,
        force_reload: bool,
    ) -> Result<RefreshOutcome, AppError> {
        if request.basis == LocationBasis::City && request.city.trim().is_empty() {
            let e = AppError::validation("City name must not be blank");
            self.report_failure(&request.city, &e);
            return Err(e);
        }

        let cache_key = request.cache_key();
        let query = request.query_string();

        let cached = match self.cache.read(&cache_key).await {
            Some(raw) => match parse_snapshot(request.basis, &raw) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    debug!(error = %e, "Cached document did not parse, treating as miss");
                    None
                }
            },
            None => None,
        };

        if !should_fetch(force_reload, cached.as_ref())
            && let Some(snapshot) = cached
        {
            info!("Using cached data");
            self.catalog.upsert(snapshot.clone());
            return Ok(RefreshOutcome::Cached(snapshot));
        }

        let raw = match self.api_client.fetch_forecast(&query).await {
            Ok(raw) => raw,
            Err(e) => {
                self.report_failure(&query, &e);
                return Err(e);
            }
        };

        let snapshot = match parse_snapshot(request.basis, &raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.report_failure(&query, &e);
                return Err(e);
            }
        };

        if let Err(e) = self.cache.write(&cache_key, &raw).await {
            warn!(error = %e, "Failed to write forecast to cache");
        }

        info!(name = %snapshot.display_name(), "Data fetch success");
        self.catalog.upsert(snapshot.clone());
        Ok(RefreshOutcome::Fetched(snapshot))
    }

    fn report_failure(&self, query: &str, error: &AppError) {
        warn!(query = %query, error = %error, "Weather update failed");
        // No subscribers is fine; the error is still returned to the caller.
        let _ = self.failures.send(FetchFailure {
            query: query.to_string(),
            message: error.to_string(),
            unreachable: error.is_unreachable(),
        });
    }

    /// Cancel in-flight refreshes and wait for their tasks to finish.
    pub async fn shutdown(&self) {
        self.cancellation_token.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        info!("Weather coordinator stopped");
    }
}

fn parse_snapshot(basis: LocationBasis, raw: &str) -> Result<WeatherSnapshot, AppError> {
    let payload: ForecastResponse = serde_json::from_str(raw)?;
    Ok(WeatherSnapshot::new(basis, payload))
}
