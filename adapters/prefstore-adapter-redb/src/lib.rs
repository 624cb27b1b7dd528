//! redb-backed durable settings adapter.
//!
//! Stores one table mapping setting keys to JSON-encoded scalar values in a
//! single redb file. Every write runs in its own redb write transaction, so a
//! key is replaced atomically and a failed commit leaves the previous value
//! intact. Blocking redb calls run under `spawn_blocking`.

#![forbid(unsafe_code)]

mod error;
pub mod storage;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub use error::Error;

use prefstore::prelude::*;
use prefstore::SettingValue;

/// redb-based implementation of [`SettingsAdapter`].
#[derive(Debug)]
pub struct RedbSettingsAdapter {
	db: Arc<redb::Database>,
}

impl RedbSettingsAdapter {
	/// Open (or create) the settings database at the given file path.
	///
	/// Parent directories are created as needed. The settings table is
	/// initialized on first open so later reads never race table creation.
	pub async fn open(db_path: impl Into<PathBuf>) -> PsResult<Self> {
		let db_path = db_path.into();

		if let Some(parent) = db_path.parent() {
			if !parent.as_os_str().is_empty() {
				tokio::fs::create_dir_all(parent).await?;
			}
		}

		let db = tokio::task::spawn_blocking(move || -> PsResult<redb::Database> {
			let db = if db_path.exists() {
				redb::Database::open(&db_path).map_err(error::from_redb_error)?
			} else {
				redb::Database::create(&db_path).map_err(error::from_redb_error)?
			};

			// Initialize the table
			let tx = db.begin_write().map_err(error::from_redb_error)?;
			let _ = tx.open_table(storage::TABLE_SETTINGS).map_err(error::from_redb_error)?;
			tx.commit().map_err(error::from_redb_error)?;

			Ok(db)
		})
		.await??;

		debug!("Opened settings database");

		Ok(Self { db: Arc::new(db) })
	}
}

#[async_trait]
impl SettingsAdapter for RedbSettingsAdapter {
	async fn read(&self, key: &str) -> PsResult<Option<SettingValue>> {
		let db = Arc::clone(&self.db);
		let key = key.to_string();

		tokio::task::spawn_blocking(move || {
			use redb::ReadableDatabase;

			let tx = db.begin_read().map_err(error::from_redb_error)?;
			let table = tx.open_table(storage::TABLE_SETTINGS).map_err(error::from_redb_error)?;

			match table.get(key.as_str()).map_err(error::from_redb_error)? {
				Some(raw) => Ok(Some(storage::decode_value(raw.value())?)),
				None => Ok(None),
			}
		})
		.await?
	}

	async fn write(&self, key: &str, value: SettingValue) -> PsResult<()> {
		let db = Arc::clone(&self.db);
		let key = key.to_string();

		tokio::task::spawn_blocking(move || {
			let json = storage::encode_value(&value)?;

			let tx = db.begin_write().map_err(error::from_redb_error)?;
			{
				let mut table =
					tx.open_table(storage::TABLE_SETTINGS).map_err(error::from_redb_error)?;
				table.insert(key.as_str(), json.as_str()).map_err(error::from_redb_error)?;
			}
			// The previous value stays visible until this commit succeeds.
			tx.commit().map_err(error::from_redb_error)?;

			debug!("Committed setting '{}'", key);
			Ok(())
		})
		.await?
	}

	async fn list(&self) -> PsResult<Vec<(Box<str>, SettingValue)>> {
		let db = Arc::clone(&self.db);

		tokio::task::spawn_blocking(move || {
			use redb::{ReadableDatabase, ReadableTable};

			let tx = db.begin_read().map_err(error::from_redb_error)?;
			let table = tx.open_table(storage::TABLE_SETTINGS).map_err(error::from_redb_error)?;

			let mut results = Vec::new();
			for item in table.iter().map_err(error::from_redb_error)? {
				let (key, raw) = item.map_err(error::from_redb_error)?;
				results.push((Box::from(key.value()), storage::decode_value(raw.value())?));
			}

			Ok(results)
		})
		.await?
	}
}

// vim: ts=4
