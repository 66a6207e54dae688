use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Forecast document returned by the forecast provider.
///
/// Unknown keys are ignored, so the same type reads both fresh responses
/// and documents previously written to the on-disk cache.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ForecastResponse {
    pub location: ForecastLocation,
    pub current: CurrentConditions,
    #[serde(default)]
    pub forecast: Option<Forecast>,
}

impl ForecastResponse {
    /// Server-resolved location name, used as the catalog identity for
    /// city-based entries.
    pub fn display_name(&self) -> &str {
        &self.location.name
    }

    pub fn forecast_days(&self) -> &[ForecastDay] {
        self.forecast
            .as_ref()
            .map(|f| f.forecastday.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ForecastLocation {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub tz_id: Option<String>,
    #[serde(default)]
    pub localtime_epoch: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Condition {
    pub text: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub code: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct CurrentConditions {
    #[serde(default)]
    pub last_updated_epoch: Option<i64>,
    #[serde(default)]
    pub temp_c: f64,
    #[serde(default)]
    pub temp_f: f64,
    #[serde(default)]
    pub is_day: u8,
    pub condition: Condition,
    #[serde(default)]
    pub wind_kph: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub feelslike_c: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Forecast {
    #[serde(default)]
    pub forecastday: Vec<ForecastDay>,
}

/// One forecast day with its hourly readings in server order
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ForecastDay {
    pub date: String,
    pub date_epoch: i64,
    pub day: DaySummary,
    #[serde(default)]
    pub hour: Vec<HourlyReading>,
}

impl ForecastDay {
    pub fn hour_at(&self, epoch: i64) -> Option<&HourlyReading> {
        self.hour.iter().find(|h| h.time_epoch == epoch)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct DaySummary {
    #[serde(default)]
    pub maxtemp_c: f64,
    #[serde(default)]
    pub mintemp_c: f64,
    #[serde(default)]
    pub avgtemp_c: f64,
    #[serde(default)]
    pub daily_chance_of_rain: u8,
    pub condition: Condition,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct HourlyReading {
    pub time_epoch: i64,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub temp_c: f64,
    #[serde(default)]
    pub is_day: u8,
    pub condition: Condition,
    #[serde(default)]
    pub chance_of_rain: u8,
}

impl HourlyReading {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time_epoch, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "location": {"name": "Paris", "region": "Ile-de-France", "country": "France", "lat": 48.87, "lon": 2.33},
        "current": {"temp_c": 14.0, "condition": {"text": "Partly cloudy", "code": 1003}, "uv": 3.0},
        "forecast": {"forecastday": [{
            "date": "2024-05-01",
            "date_epoch": 1714521600,
            "day": {"maxtemp_c": 18.2, "mintemp_c": 9.1, "condition": {"text": "Sunny"}},
            "hour": [
                {"time_epoch": 1714518000, "time": "2024-05-01 00:00", "temp_c": 10.0, "condition": {"text": "Clear"}},
                {"time_epoch": 1714521600, "time": "2024-05-01 01:00", "temp_c": 9.6, "condition": {"text": "Clear"}}
            ]
        }]}
    }"#;

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let response: ForecastResponse = serde_json::from_str(BODY).unwrap();
        assert_eq!(response.display_name(), "Paris");
        assert_eq!(response.current.condition.text, "Partly cloudy");
        assert_eq!(response.forecast_days().len(), 1);
    }

    #[test]
    fn test_missing_forecast_is_empty() {
        let body = r#"{"location": {"name": "Oslo"}, "current": {"condition": {"text": "Snow"}}}"#;
        let response: ForecastResponse = serde_json::from_str(body).unwrap();
        assert!(response.forecast_days().is_empty());
    }

    #[test]
    fn test_hour_lookup_by_epoch() {
        let response: ForecastResponse = serde_json::from_str(BODY).unwrap();
        let day = &response.forecast_days()[0];

        let hour = day.hour_at(1714521600).unwrap();
        assert_eq!(hour.time, "2024-05-01 01:00");
        assert_eq!(hour.timestamp().unwrap().timestamp(), 1714521600);
        assert!(day.hour_at(42).is_none());
    }
}
