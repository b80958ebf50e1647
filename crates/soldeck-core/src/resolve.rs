// ── Value resolution ──
//
// Turns raw entity states into display-ready numbers and strings, with
// graceful degradation: anything missing, unavailable, or unparseable
// becomes null / the placeholder. Resolution errors never escape a cycle.

use std::future::Future;

use serde::Serialize;
use soldeck_api::EntityState;
use tracing::debug;

use crate::config::{CUSTOM_SLOTS, SourceMapping};
use crate::error::CoreError;

/// Placeholder shown for a text slot with no usable value.
pub const TEXT_PLACEHOLDER: &str = "--";

/// Read access to the external state store.
///
/// Implemented by [`HaClient`](soldeck_api::HaClient) for real use and by
/// in-memory fakes in tests.
pub trait StateStore {
    /// Fetch one entity state. `Ok(None)` when the entity does not exist.
    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<EntityState>, CoreError>> + Send;
}

// ── Pure resolution ─────────────────────────────────────────────────

/// Resolve a numeric reading: parse as `f64`, round to one decimal.
///
/// Missing entity, unavailable/unknown state, or a parse failure all
/// yield `None` -- never an error.
pub fn resolve_numeric(state: Option<&EntityState>) -> Option<f64> {
    let state = state.filter(|s| s.is_available())?;
    let value: f64 = state.state.trim().parse().ok()?;
    Some((value * 10.0).round() / 10.0)
}

/// Resolve a text reading: raw value plus unit annotation, trimmed.
///
/// Missing or unavailable states yield the `"--"` placeholder.
pub fn resolve_text(state: Option<&EntityState>) -> String {
    match state.filter(|s| s.is_available()) {
        None => TEXT_PLACEHOLDER.to_owned(),
        Some(s) => format!("{} {}", s.state, s.unit().unwrap_or_default())
            .trim()
            .to_owned(),
    }
}

// ── Per-cycle sampling ──────────────────────────────────────────────

/// A resolved custom slot: label plus formatted value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotValue {
    pub name: String,
    pub value: String,
}

/// All resolved values for one cycle. Nulls preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampledValues {
    pub solar_w: Option<f64>,
    pub grid_w: Option<f64>,
    pub house_w: Option<f64>,
    pub battery_w: Option<f64>,
    pub battery_soc: Option<f64>,
    pub yield_today_kwh: Option<f64>,
    pub yield_month_kwh: Option<f64>,
    pub yield_year_kwh: Option<f64>,
    pub yield_total_kwh: Option<f64>,
    pub grid_import_kwh: Option<f64>,
    pub grid_export_kwh: Option<f64>,
    pub slots: Vec<SlotValue>,
}

/// Fetch a bound entity's state, degrading store errors to missing.
///
/// An unset or empty binding skips the store call entirely.
async fn fetch_state<S: StateStore + Sync>(
    store: &S,
    binding: Option<&String>,
) -> Option<EntityState> {
    let entity_id = binding.map(String::as_str).filter(|id| !id.is_empty())?;
    match store.get_state(entity_id).await {
        Ok(state) => state,
        Err(e) => {
            debug!(entity_id, error = %e, "state read failed, treating as missing");
            None
        }
    }
}

async fn numeric<S: StateStore + Sync>(store: &S, binding: Option<&String>) -> Option<f64> {
    resolve_numeric(fetch_state(store, binding).await.as_ref())
}

/// Resolve every configured source for one cycle.
///
/// One store read per bound field, in mapping order. Purely derived from
/// the store at call time -- nothing is cached across cycles.
pub async fn sample<S: StateStore + Sync>(store: &S, mapping: &SourceMapping) -> SampledValues {
    let mut slots = Vec::with_capacity(CUSTOM_SLOTS);
    for index in 0..CUSTOM_SLOTS {
        let slot = mapping.slot(index);
        let value = resolve_text(fetch_state(store, slot.entity_id.as_ref()).await.as_ref());
        slots.push(SlotValue {
            name: slot.name,
            value,
        });
    }

    SampledValues {
        solar_w: numeric(store, mapping.solar.as_ref()).await,
        grid_w: numeric(store, mapping.grid.as_ref()).await,
        house_w: numeric(store, mapping.house.as_ref()).await,
        battery_w: numeric(store, mapping.battery.as_ref()).await,
        battery_soc: numeric(store, mapping.battery_soc.as_ref()).await,
        yield_today_kwh: numeric(store, mapping.yield_today.as_ref()).await,
        yield_month_kwh: numeric(store, mapping.yield_month.as_ref()).await,
        yield_year_kwh: numeric(store, mapping.yield_year.as_ref()).await,
        yield_total_kwh: numeric(store, mapping.yield_total.as_ref()).await,
        grid_import_kwh: numeric(store, mapping.grid_import.as_ref()).await,
        grid_export_kwh: numeric(store, mapping.grid_export.as_ref()).await,
        slots,
    }
}
