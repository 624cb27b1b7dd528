//! In-memory settings adapter for tests and ephemeral stores.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::adapter::SettingsAdapter;
use crate::error::{Error, PsResult};
use crate::types::SettingValue;

/// Non-durable [`SettingsAdapter`] backed by a HashMap.
///
/// Intended as a substitute for a durable adapter in tests. Supports fault
/// injection so failure paths (failed commits, unreadable medium) can be
/// exercised deterministically.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
	values: parking_lot::RwLock<HashMap<Box<str>, SettingValue>>,
	fail_writes: AtomicBool,
	fail_reads: AtomicBool,
}

impl MemoryAdapter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Make every subsequent write fail with a persistence error,
	/// leaving stored values untouched.
	pub fn set_fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::Release);
	}

	/// Make every subsequent read fail, simulating an unreadable medium.
	pub fn set_fail_reads(&self, fail: bool) {
		self.fail_reads.store(fail, Ordering::Release);
	}
}

#[async_trait]
impl SettingsAdapter for MemoryAdapter {
	async fn read(&self, key: &str) -> PsResult<Option<SettingValue>> {
		if self.fail_reads.load(Ordering::Acquire) {
			return Err(Error::Persistence("injected read failure".into()));
		}

		Ok(self.values.read().get(key).cloned())
	}

	async fn write(&self, key: &str, value: SettingValue) -> PsResult<()> {
		if self.fail_writes.load(Ordering::Acquire) {
			return Err(Error::Persistence("injected write failure".into()));
		}

		self.values.write().insert(key.into(), value);
		Ok(())
	}

	async fn list(&self) -> PsResult<Vec<(Box<str>, SettingValue)>> {
		if self.fail_reads.load(Ordering::Acquire) {
			return Err(Error::Persistence("injected read failure".into()));
		}

		Ok(self.values.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}
}

// vim: ts=4
