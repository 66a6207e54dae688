use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Extension shared by every cache file; `CacheStore::clear_all` only
/// removes files carrying it.
pub const CACHE_FILE_EXTENSION: &str = "json";

/// Whether a location is identified by city name or by coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationBasis {
    City,
    LatLong,
}

/// A place to fetch weather for, built per user or device action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationRequest {
    pub basis: LocationBasis,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl LocationRequest {
    pub fn city(city: impl Into<String>) -> Self {
        Self {
            basis: LocationBasis::City,
            city: city.into(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    pub fn lat_long(latitude: f64, longitude: f64) -> Self {
        Self {
            basis: LocationBasis::LatLong,
            city: String::new(),
            latitude,
            longitude,
        }
    }

    /// The `q` parameter sent to the forecast provider: the city name when
    /// one is present, otherwise `"{latitude},{longitude}"`.
    pub fn query_string(&self) -> String {
        if self.basis == LocationBasis::City && !self.city.trim().is_empty() {
            self.city.clone()
        } else {
            format!("{},{}", self.latitude, self.longitude)
        }
    }

    /// File name of the on-disk slot for this location. Depends only on the
    /// city for `City` and only on the coordinates for `LatLong`. The stem is
    /// percent-encoded, so distinct cities never share a slot.
    pub fn cache_key(&self) -> String {
        let stem = match self.basis {
            LocationBasis::City => self.city.clone(),
            // `+ 0.0` folds -0.0 into 0.0 so equal coordinates share a key.
            LocationBasis::LatLong => {
                format!("{}_{}", self.latitude + 0.0, self.longitude + 0.0)
            }
        };
        format!("{}.{}", urlencoding::encode(&stem), CACHE_FILE_EXTENSION)
    }
}
