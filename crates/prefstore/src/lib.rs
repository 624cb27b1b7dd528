//! Durable, observable settings store.
//!
//! A process-wide container of named scalar settings. Consumers observe a key
//! and receive its current value immediately, followed by every durably
//! committed change; writes complete only after the backing medium has
//! committed them. Persistence is pluggable through the [`SettingsAdapter`]
//! trait, so production code can run on an embedded database while tests
//! substitute the in-memory adapter.

#![forbid(unsafe_code)]

pub mod adapter;
pub mod error;
pub mod memory;
pub mod prelude;
pub mod store;
pub mod types;

pub use adapter::SettingsAdapter;
pub use error::{Error, PsResult};
pub use memory::MemoryAdapter;
pub use store::{SettingsStore, StoreConfig};
pub use types::{
	ChangeEvent, FrozenSettingsRegistry, Setting, SettingDefinition, SettingDefinitionBuilder,
	SettingValidator, SettingValue, SettingsRegistry,
};

// vim: ts=4
