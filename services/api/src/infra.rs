use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveDate;
use garderobe::config::AppConfig;
use garderobe::workflows::rental::{InMemoryRentalStore, RentalEngine};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Builds the engine over the in-memory reference store. Swapping in a
/// database-backed store is a deployment concern, not an engine change.
pub(crate) fn build_engine(config: &AppConfig) -> Arc<RentalEngine<InMemoryRentalStore>> {
    Arc::new(RentalEngine::new(
        Arc::new(InMemoryRentalStore::default()),
        config.rental.to_rental_config(),
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
