use common::models::ForecastResponse;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use utoipa::ToSchema;

use crate::location::LocationBasis;

/// A parsed forecast document plus the basis it was fetched under
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherSnapshot {
    pub basis: LocationBasis,
    pub payload: ForecastResponse,
}

/// Merge identity of a snapshot within the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotIdentity<'a> {
    /// The single slot reserved for the device location.
    LatLong,
    /// A city entry, keyed by the server-resolved location name.
    City(&'a str),
}

impl WeatherSnapshot {
    pub fn new(basis: LocationBasis, payload: ForecastResponse) -> Self {
        Self { basis, payload }
    }

    pub fn display_name(&self) -> &str {
        self.payload.display_name()
    }

    pub fn identity(&self) -> SnapshotIdentity<'_> {
        match self.basis {
            LocationBasis::LatLong => SnapshotIdentity::LatLong,
            LocationBasis::City => SnapshotIdentity::City(self.display_name()),
        }
    }
}

pub type CatalogView = Arc<Vec<WeatherSnapshot>>;

/// Whether an upsert replaced an existing entry or appended a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Replaced(usize),
    Appended(usize),
}

#[derive(Debug)]
pub struct WeatherCatalog {
    entries: watch::Sender<CatalogView>,
}

impl WeatherCatalog {
    pub fn new() -> Self {
        let (entries, _) = watch::channel(Arc::new(Vec::new()));
        Self { entries }
    }

    /// Replace the entry with the same identity in place, or append.
    pub fn upsert(&self, snapshot: WeatherSnapshot) -> UpsertOutcome {
        let mut outcome = UpsertOutcome::Appended(0);
        let mut count = 0;

        self.entries.send_modify(|view| {
            let entries = Arc::make_mut(view);
            let position = entries
                .iter()
                .position(|e| e.identity() == snapshot.identity());

            outcome = match position {
                Some(index) => {
                    entries[index] = snapshot;
                    UpsertOutcome::Replaced(index)
                }
                None => {
                    entries.push(snapshot);
                    UpsertOutcome::Appended(entries.len() - 1)
                }
            };
            count = entries.len();
        });

        info!(?outcome, count, "Weather data updated");
        outcome
    }

    /// Remove the first entry whose resolved location name is `name`.
    /// Returns false when nothing matched.
    pub fn remove_by_display_name(&self, name: &str) -> bool {
        let removed = self.entries.send_if_modified(|view| {
            match view.iter().position(|e| e.display_name() == name) {
                Some(index) => {
                    Arc::make_mut(view).remove(index);
                    true
                }
                None => false,
            }
        });

        if removed {
            info!(name = %name, count = self.len(), "Weather entry removed");
        }
        removed
    }

    pub fn snapshot(&self) -> CatalogView {
        self.entries.borrow().clone()
    }

    /// Receiver notified after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<CatalogView> {
        self.entries.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WeatherCatalog {
    fn default() -> Self {
        Self::new()
    }
}
