use common::errors::AppError;
use common::http_client::{HttpClient, RawDocument};
use tracing::{info, instrument};

/// Number of forecast days requested per location.
pub const FORECAST_DAYS: u8 = 4;

/// Client for the forecast provider's `forecast.json` endpoint
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl WeatherApiClient {
    pub fn new(http_client: HttpClient, base_url: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn forecast_url(&self, query: &str) -> String {
        format!(
            "{}/forecast.json?key={}&q={}&aqi=no&days={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query),
            FORECAST_DAYS
        )
    }

    /// Fetch the raw forecast document for `query`.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn fetch_forecast(&self, query: &str) -> Result<RawDocument, AppError> {
        info!("Fetching forecast from API");
        self.http_client.get_text(&self.forecast_url(query)).await
    }
}
