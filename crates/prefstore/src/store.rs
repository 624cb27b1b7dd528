//! Settings store: durable writes with per-key serialization, cached reads,
//! and broadcast-backed observation.

use futures_core::Stream;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::adapter::SettingsAdapter;
use crate::error::{Error, PsResult};
use crate::types::{now_timestamp, ChangeEvent, FrozenSettingsRegistry, Setting, SettingValue};

/// Store configuration options
#[derive(Debug, Clone)]
pub struct StoreConfig {
	/// Capacity of the LRU read cache
	pub cache_size: usize,

	/// Broadcast channel capacity for change events
	pub broadcast_capacity: usize,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self { cache_size: 100, broadcast_capacity: 1000 }
	}
}

/// LRU cache for resolved setting values.
///
/// Miss-path fills are epoch-guarded: every committed write bumps the epoch,
/// and a fill is dropped when the epoch moved between the adapter read and
/// the fill. A read that suspended across a write can therefore never clobber
/// the newer committed value.
struct SettingsCache {
	inner: parking_lot::RwLock<CacheInner>,
}

struct CacheInner {
	values: LruCache<String, SettingValue>,
	epoch: u64,
}

impl SettingsCache {
	fn new(capacity: usize) -> Self {
		let non_zero = NonZeroUsize::new(capacity)
			.or_else(|| NonZeroUsize::new(100))
			.unwrap_or(NonZeroUsize::MIN);
		Self {
			inner: parking_lot::RwLock::new(CacheInner {
				values: LruCache::new(non_zero),
				epoch: 0,
			}),
		}
	}

	fn get(&self, key: &str) -> Option<SettingValue> {
		let mut inner = self.inner.write();
		inner.values.get(key).cloned()
	}

	fn epoch(&self) -> u64 {
		self.inner.read().epoch
	}

	/// Cache a value read on a miss, unless a write landed since `seen_epoch`
	fn fill(&self, key: String, value: SettingValue, seen_epoch: u64) {
		let mut inner = self.inner.write();
		if inner.epoch == seen_epoch {
			inner.values.put(key, value);
		}
	}

	/// Cache a freshly committed value and invalidate in-flight fills
	fn put_committed(&self, key: String, value: SettingValue) {
		let mut inner = self.inner.write();
		inner.epoch += 1;
		inner.values.put(key, value);
	}
}

/// Settings store - main interface for reading, writing, and observing settings.
///
/// One instance owns the backing adapter for the lifetime of the process.
/// Writes to the same key are serialized internally; writes to different keys
/// and all reads proceed without mutual blocking.
pub struct SettingsStore {
	registry: FrozenSettingsRegistry,
	adapter: Arc<dyn SettingsAdapter>,
	cache: SettingsCache,
	change_tx: broadcast::Sender<ChangeEvent>,
	write_locks: parking_lot::RwLock<HashMap<Box<str>, Arc<tokio::sync::Mutex<()>>>>,
}

impl SettingsStore {
	pub fn new(
		registry: FrozenSettingsRegistry,
		adapter: Arc<dyn SettingsAdapter>,
		config: StoreConfig,
	) -> Self {
		let (change_tx, _) = broadcast::channel(config.broadcast_capacity);

		Self {
			registry,
			adapter,
			cache: SettingsCache::new(config.cache_size),
			change_tx,
			write_locks: parking_lot::RwLock::new(HashMap::new()),
		}
	}

	/// Validate a key before any I/O. Keys are non-empty, without whitespace
	/// or path separators.
	fn validate_key(key: &str) -> PsResult<()> {
		if key.is_empty() || key.chars().any(|c| c.is_whitespace() || c == '/') {
			return Err(Error::InvalidKey(key.into()));
		}
		Ok(())
	}

	/// Resolve the default for a key: registered default, else empty string.
	fn default_for(&self, key: &str) -> SettingValue {
		self.registry
			.get(key)
			.and_then(|def| def.default.clone())
			.unwrap_or_else(|| SettingValue::String(String::new()))
	}

	/// Get or create the write-serialization lock for a key
	fn write_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
		// Fast path: lock already exists
		{
			let locks = self.write_locks.read();
			if let Some(lock) = locks.get(key) {
				return Arc::clone(lock);
			}
		}

		let mut locks = self.write_locks.write();
		Arc::clone(locks.entry(key.into()).or_default())
	}

	/// Drop the map entry once no other writer holds the lock; the next
	/// same-key write recreates it, so the map never outgrows the set of
	/// in-flight writes.
	fn release_write_lock(&self, key: &str, lock: Arc<tokio::sync::Mutex<()>>) {
		let mut locks = self.write_locks.write();
		// One reference in the map plus the caller's
		if Arc::strong_count(&lock) == 2 {
			locks.remove(key);
		}
	}

	/// Get the current value for a key (stored value -> default).
	pub async fn get(&self, key: &str) -> PsResult<SettingValue> {
		Self::validate_key(key)?;

		// Check cache
		if let Some(value) = self.cache.get(key) {
			debug!("Setting cache hit: {}", key);
			return Ok(value);
		}

		// Capture the epoch before the read so a write that commits while the
		// read is in flight invalidates the fill below.
		let epoch = self.cache.epoch();
		if let Some(value) = self.adapter.read(key).await? {
			self.cache.fill(key.to_string(), value.clone(), epoch);
			return Ok(value);
		}

		Ok(self.default_for(key))
	}

	/// Durably persist a value, then notify all active observers of the key.
	///
	/// Suspends until the adapter's durability guarantee is met. Concurrent
	/// writes to the same key are applied in commit order; on failure the
	/// stored value, the cache, and observers are all left untouched. There is
	/// no cancellation handle: an issued write runs to completion exactly once.
	pub async fn write(&self, key: &str, value: impl Into<SettingValue>) -> PsResult<Setting> {
		Self::validate_key(key)?;
		let value = value.into();

		if let Some(def) = self.registry.get(key) {
			// Validate type matches definition (if default exists)
			if let Some(default) = &def.default {
				if !value.matches_type(default) {
					return Err(Error::Validation(format!(
						"Type mismatch for setting '{}': expected {}, got {}",
						key,
						default.type_name(),
						value.type_name()
					)));
				}
			}

			// Run custom validator if present
			if let Some(validator) = &def.validator {
				validator(&value)?;
			}
		}

		// Serialize writes to the same key; writes to other keys are unaffected.
		let lock = self.write_lock(key);
		let guard = lock.lock().await;

		if let Err(err) = self.adapter.write(key, value.clone()).await {
			drop(guard);
			self.release_write_lock(key, lock);
			return Err(err);
		}

		// Commit is durable; make it visible in commit order. The broadcast
		// happens while the per-key lock is held so observers never see
		// same-key events out of order.
		self.cache.put_committed(key.to_string(), value.clone());
		let _ = self.change_tx.send(ChangeEvent { key: key.into(), value: value.clone() });

		drop(guard);
		self.release_write_lock(key, lock);

		info!("Setting '{}' updated", key);

		Ok(Setting { key: key.to_string(), value, updated_at: now_timestamp() })
	}

	/// Observe a key: an infinite stream yielding the current value
	/// immediately, then every subsequently committed value for that key.
	///
	/// Multiple observers of one key are independent and each receives every
	/// update; under broadcast lag intermediate values may be skipped but the
	/// stream converges on the latest committed value, never out of order.
	/// Dropping the stream cancels the observation immediately. If the backing
	/// medium becomes unreadable the stream yields a terminal
	/// [`Error::Observation`] and ends.
	pub fn observe(
		&self,
		key: &str,
	) -> PsResult<Pin<Box<dyn Stream<Item = PsResult<SettingValue>> + Send>>> {
		Self::validate_key(key)?;

		// Subscribe to the broadcast FIRST so no write committed between the
		// initial read and subscription is lost.
		let mut rx = self.change_tx.subscribe();

		let adapter = Arc::clone(&self.adapter);
		let default = self.default_for(key);
		let key: Box<str> = key.into();

		let stream = async_stream::stream! {
			// Initial emission: current stored value, or the default.
			match adapter.read(&key).await {
				Ok(Some(value)) => yield Ok(value),
				Ok(None) => yield Ok(default),
				Err(err) => {
					yield Err(Error::Observation(format!(
						"initial read of '{}' failed: {}",
						key, err
					)));
					return;
				}
			}

			// Then every committed change for this key.
			loop {
				match rx.recv().await {
					Ok(event) => {
						if event.key.as_ref() != key.as_ref() {
							continue;
						}
						yield Ok(event.value);
					}
					Err(broadcast::error::RecvError::Lagged(n)) => {
						warn!("Observer of '{}' lagged, skipped {} events", key, n);

						// Re-read so the observer converges on the latest
						// committed value despite the skipped events.
						match adapter.read(&key).await {
							Ok(Some(value)) => yield Ok(value),
							Ok(None) => continue,
							Err(err) => {
								yield Err(Error::Observation(err.to_string()));
								break;
							}
						}
					}
					Err(broadcast::error::RecvError::Closed) => break,
				}
			}
		};

		Ok(Box::pin(stream))
	}

	/// Enumerate all persisted settings.
	pub async fn list(&self) -> PsResult<Vec<(Box<str>, SettingValue)>> {
		self.adapter.list().await
	}

	/// Type-safe getters (error if the resolved value has another type)
	pub async fn get_string(&self, key: &str) -> PsResult<String> {
		match self.get(key).await? {
			SettingValue::String(s) => Ok(s),
			v => Err(Error::Validation(format!(
				"Setting '{}' is not a string, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub async fn get_int(&self, key: &str) -> PsResult<i64> {
		match self.get(key).await? {
			SettingValue::Int(i) => Ok(i),
			v => Err(Error::Validation(format!(
				"Setting '{}' is not an integer, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub async fn get_bool(&self, key: &str) -> PsResult<bool> {
		match self.get(key).await? {
			SettingValue::Bool(b) => Ok(b),
			v => Err(Error::Validation(format!(
				"Setting '{}' is not a boolean, got {}",
				key,
				v.type_name()
			))),
		}
	}

	/// Get reference to registry (for listing registered definitions)
	pub fn registry(&self) -> &FrozenSettingsRegistry {
		&self.registry
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryAdapter;
	use crate::types::SettingsRegistry;

	fn empty_registry_store(adapter: Arc<MemoryAdapter>) -> SettingsStore {
		SettingsStore::new(SettingsRegistry::new().freeze(), adapter, StoreConfig::default())
	}

	#[tokio::test]
	async fn write_locks_are_pruned_after_each_write() {
		let store = empty_registry_store(Arc::new(MemoryAdapter::new()));

		store.write("a.one", 1i64).await.expect("write failed");
		store.write("a.two", 2i64).await.expect("write failed");
		store.write("a.one", 3i64).await.expect("write failed");

		assert!(store.write_locks.read().is_empty(), "lock map must not retain idle keys");
	}

	#[tokio::test]
	async fn write_locks_are_pruned_after_failed_write() {
		let adapter = Arc::new(MemoryAdapter::new());
		let store = empty_registry_store(Arc::clone(&adapter));

		adapter.set_fail_writes(true);
		store.write("a.one", 1i64).await.expect_err("write should fail");

		assert!(store.write_locks.read().is_empty(), "lock map must not retain failed keys");
	}
}

// vim: ts=4
