// soldeck-core: Update/aggregation/rotation engine between the Home
// Assistant state store and the display push sink.

pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod payload;
pub mod resolve;
pub mod rotation;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    ConnectionConfig, CustomSlot, DisplayOptions, OptionsHandle, PageConfig, SourceMapping,
    SwitchMode, TlsVerification,
};
pub use coordinator::Coordinator;
pub use dispatch::{PushSink, SinkConfig};
pub use error::CoreError;
pub use payload::{DisplayFrame, Payload};
pub use resolve::{SampledValues, SlotValue, StateStore};
pub use rotation::{LastSwitch, PagePosition, PageSet, RotationState};

// Re-export the collaborator state type so `StateStore` implementors
// don't need a direct soldeck-api dependency.
pub use soldeck_api::EntityState;
