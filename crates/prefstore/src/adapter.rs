//! Settings Persistence Adapter
//!
//! Trait for pluggable durable backends that store scalar setting values by
//! key. The store layers observation and per-key write serialization on top;
//! an adapter only has to provide atomic single-key reads and writes that
//! survive process restart.
//!
//! Each adapter implementation provides its own constructor handling
//! backend-specific initialization (database path, capacity, etc.).

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::PsResult;
use crate::types::SettingValue;

/// Durable key-value backend for setting values.
///
/// Contract:
/// - `read` returns `None` for keys that have never been written.
/// - `write` replaces the previous value atomically; after a failed write the
///   previously stored value must still be readable intact.
/// - Implementations must be safe for concurrent callers; the store serializes
///   writes per key but reads and writes to different keys run concurrently.
#[async_trait]
pub trait SettingsAdapter: Debug + Send + Sync {
	/// Read the stored value at a key. Returns None if never written.
	async fn read(&self, key: &str) -> PsResult<Option<SettingValue>>;

	/// Durably persist a value at a key, replacing any previous value.
	/// Must not return before the durability guarantee is met.
	async fn write(&self, key: &str, value: SettingValue) -> PsResult<()>;

	/// Enumerate all persisted settings (diagnostics and export).
	async fn list(&self) -> PsResult<Vec<(Box<str>, SettingValue)>>;
}

// vim: ts=4
