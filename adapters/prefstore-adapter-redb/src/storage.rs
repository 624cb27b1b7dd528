use prefstore::error::PsResult;
use prefstore::SettingValue;

/// Settings storage table: key -> JSON-encoded scalar value
pub const TABLE_SETTINGS: redb::TableDefinition<&str, &str> =
	redb::TableDefinition::new("settings");

/// Encode a setting value as its JSON string form
pub fn encode_value(value: &SettingValue) -> PsResult<String> {
	Ok(serde_json::to_string(value).map_err(crate::Error::from)?)
}

/// Decode a stored JSON string back into a setting value
pub fn decode_value(raw: &str) -> PsResult<SettingValue> {
	Ok(serde_json::from_str(raw).map_err(crate::Error::from)?)
}

// vim: ts=4
