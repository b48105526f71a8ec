//! Configuration types and loading.
//!
//! - `ControlConfig`: Top-level configuration with validation and TOML round-trip
//! - `EngineConfig`: Healing bound and stage sequence
//! - `EventBusConfig`: Event queue sizing

mod settings;

pub use settings::{ControlConfig, EngineConfig, EventBusConfig, StageSpec};
