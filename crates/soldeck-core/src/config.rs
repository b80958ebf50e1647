// ── Runtime configuration ──
//
// These types describe *what* to sample and *how* the display rotates.
// They are built by the CLI/config layer and handed in -- core never
// reads config files. `DisplayOptions` is the per-cycle snapshot; the
// coordinator re-loads it from an `OptionsHandle` on every tick, so an
// out-of-band options update takes effect on the next cycle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Number of pages the display firmware knows about.
pub const PAGE_SLOTS: usize = 5;

/// Number of generic custom value slots on the display.
pub const CUSTOM_SLOTS: usize = 12;

// ── Connection ──────────────────────────────────────────────────────

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed local instances).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single Home Assistant instance.
///
/// Built by the CLI/config layer, passed to
/// [`Coordinator::connect`](crate::Coordinator::connect).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Instance URL (e.g., `http://homeassistant.local:8123`).
    pub url: Url,
    /// Long-lived access token.
    pub token: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

// ── Page behavior ───────────────────────────────────────────────────

/// How the display moves between pages.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SwitchMode {
    /// The coordinator rotates pages on a timer.
    #[default]
    Auto,
    /// The display's own touch input drives navigation; the coordinator
    /// pins the first enabled page.
    Touch,
    /// Timer rotation *and* touch navigation.
    Both,
}

/// Page enablement and timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Enable flag per page, 1 through 5.
    pub enabled: [bool; PAGE_SLOTS],
    pub switch_mode: SwitchMode,
    /// Seconds between automatic page rotations.
    pub rotation_interval_secs: u64,
    /// Seconds between update cycles.
    pub sample_interval_secs: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            enabled: [true; PAGE_SLOTS],
            switch_mode: SwitchMode::default(),
            rotation_interval_secs: 10,
            sample_interval_secs: 5,
        }
    }
}

impl PageConfig {
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs.max(1))
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs.max(1))
    }
}

// ── Source mapping ──────────────────────────────────────────────────

/// One generic display slot: a label plus an optional entity binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSlot {
    pub name: String,
    pub entity_id: Option<String>,
}

/// Which entities feed which display fields.
///
/// Every binding is optional -- an unbound field resolves to null (numeric)
/// or the placeholder (text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMapping {
    pub solar: Option<String>,
    pub grid: Option<String>,
    pub house: Option<String>,
    pub battery: Option<String>,
    pub battery_soc: Option<String>,
    pub yield_today: Option<String>,
    pub yield_month: Option<String>,
    pub yield_year: Option<String>,
    pub yield_total: Option<String>,
    pub grid_import: Option<String>,
    pub grid_export: Option<String>,
    /// The twelve generic slots. Fewer entries are padded with defaults.
    pub slots: Vec<CustomSlot>,
}

impl Default for SourceMapping {
    fn default() -> Self {
        Self {
            solar: None,
            grid: None,
            house: None,
            battery: None,
            battery_soc: None,
            yield_today: None,
            yield_month: None,
            yield_year: None,
            yield_total: None,
            grid_import: None,
            grid_export: None,
            slots: (1..=CUSTOM_SLOTS).map(CustomSlot::default_for).collect(),
        }
    }
}

impl CustomSlot {
    /// The default slot for a 1-based position: `"Custom N"`, unbound.
    fn default_for(position: usize) -> Self {
        Self {
            name: format!("Custom {position}"),
            entity_id: None,
        }
    }
}

impl SourceMapping {
    /// The slot at a 0-based index, padded with the default when the
    /// configured list is shorter than the display's twelve.
    pub fn slot(&self, index: usize) -> CustomSlot {
        self.slots
            .get(index)
            .cloned()
            .unwrap_or_else(|| CustomSlot::default_for(index + 1))
    }
}

// ── Options snapshot ────────────────────────────────────────────────

/// Everything the coordinator needs per cycle, as one immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub sources: SourceMapping,
    pub pages: PageConfig,
    /// Render power values in kW instead of W.
    pub show_kw: bool,
}

/// Shared, swappable options holder.
///
/// The coordinator loads a fresh snapshot every cycle; external callers
/// (the config/HTTP layer) replace the whole snapshot with `store()`.
/// Lock-free on the read path.
#[derive(Debug, Clone, Default)]
pub struct OptionsHandle {
    inner: Arc<ArcSwap<DisplayOptions>>,
}

impl OptionsHandle {
    pub fn new(options: DisplayOptions) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(options)),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<DisplayOptions> {
        self.inner.load_full()
    }

    /// Replace the snapshot. Takes effect on the next cycle.
    pub fn store(&self, options: DisplayOptions) {
        self.inner.store(Arc::new(options));
    }
}
