use prefstore::{Error, SettingDefinition, SettingValue, SettingsRegistry};

#[test]
fn test_builder_requires_description() {
	let result = SettingDefinition::builder("user.name").default("").build();
	assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_duplicate_registration_is_rejected() {
	let mut registry = SettingsRegistry::new();

	registry
		.register(
			SettingDefinition::builder("user.name")
				.description("Display name")
				.default("")
				.build()
				.expect("Failed to build definition"),
		)
		.expect("Failed to register setting");

	let result = registry.register(
		SettingDefinition::builder("user.name")
			.description("Display name again")
			.default("")
			.build()
			.expect("Failed to build definition"),
	);
	assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_frozen_registry_lookup() {
	let mut registry = SettingsRegistry::new();
	assert!(registry.is_empty());

	registry
		.register(
			SettingDefinition::builder("app.dark_mode")
				.description("Dark theme toggle")
				.default(false)
				.build()
				.expect("Failed to build definition"),
		)
		.expect("Failed to register setting");
	assert_eq!(registry.len(), 1);

	let frozen = registry.freeze();
	let def = frozen.get("app.dark_mode").expect("definition missing");
	assert_eq!(def.default, Some(SettingValue::Bool(false)));
	assert!(frozen.get("app.light_mode").is_none());
	assert_eq!(frozen.list().count(), 1);
}

#[test]
fn test_value_type_checks() {
	assert!(SettingValue::from("a").matches_type(&SettingValue::from("b")));
	assert!(SettingValue::Int(1).matches_type(&SettingValue::Int(2)));
	assert!(SettingValue::Bool(true).matches_type(&SettingValue::Bool(false)));
	assert!(!SettingValue::Bool(true).matches_type(&SettingValue::Int(1)));
	assert!(!SettingValue::from("1").matches_type(&SettingValue::Int(1)));

	assert_eq!(SettingValue::from("x").type_name(), "string");
	assert_eq!(SettingValue::Int(0).type_name(), "int");
	assert_eq!(SettingValue::Bool(true).type_name(), "bool");
}

#[test]
fn test_untagged_value_serialization() {
	// Untagged round-trips rely on Bool being tried before Int
	let json = serde_json::to_string(&SettingValue::Bool(true)).expect("serialize failed");
	assert_eq!(json, "true");
	let back: SettingValue = serde_json::from_str(&json).expect("deserialize failed");
	assert_eq!(back, SettingValue::Bool(true));

	let json = serde_json::to_string(&SettingValue::Int(42)).expect("serialize failed");
	assert_eq!(json, "42");
	let back: SettingValue = serde_json::from_str(&json).expect("deserialize failed");
	assert_eq!(back, SettingValue::Int(42));

	let json = serde_json::to_string(&SettingValue::from("Ada")).expect("serialize failed");
	assert_eq!(json, "\"Ada\"");
	let back: SettingValue = serde_json::from_str(&json).expect("deserialize failed");
	assert_eq!(back, SettingValue::from("Ada"));
}

#[test]
fn test_validator_runs_on_build_result() {
	let def = SettingDefinition::builder("net.port")
		.description("Listen port")
		.default(8080i64)
		.validator(|value| match value {
			SettingValue::Int(port) if (1..=65535).contains(port) => Ok(()),
			_ => Err(Error::Validation("port must be between 1 and 65535".into())),
		})
		.build()
		.expect("Failed to build definition");

	let validator = def.validator.as_ref().expect("validator missing");
	assert!(validator(&SettingValue::Int(8080)).is_ok());
	assert!(validator(&SettingValue::Int(0)).is_err());

	// Clones drop the validator function
	assert!(def.clone().validator.is_none());
}

// vim: ts=4
