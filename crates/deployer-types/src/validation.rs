//! Configuration validation utilities.
//!
//! Implementation tables in the configuration (`[account.implementations.*]`)
//! are kept as raw TOML so each implementation can declare its own schema.
//! This module provides the small schema language those implementations use.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong TOML type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// The type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// A hex string, optionally `0x`-prefixed, with an optional exact byte length.
	HexString { bytes: Option<usize> },
	/// An integer value with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// A boolean value.
	Boolean,
	/// An array whose elements all have the same type.
	Array(Box<FieldType>),
}

/// Custom validation run after the type check succeeds.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a configuration schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// A validation schema made of required and optional fields.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML table against this schema.
	///
	/// Required fields must be present; optional fields are checked only when
	/// present. Custom validators run after the type check.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			check_field(field, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				check_field(field, value)?;
			}
		}

		Ok(())
	}
}

fn check_field(field: &Field, value: &toml::Value) -> Result<(), ValidationError> {
	validate_field_type(&field.name, value, &field.field_type)?;
	if let Some(validator) = &field.validator {
		validator(value).map_err(|message| ValidationError::InvalidValue {
			field: field.name.clone(),
			message,
		})?;
	}
	Ok(())
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(field_name, "string", value));
			}
		},
		FieldType::HexString { bytes } => {
			let s = value
				.as_str()
				.ok_or_else(|| type_mismatch(field_name, "hex string", value))?;
			let digits = crate::utils::without_0x_prefix(s.trim());
			if digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: "not a valid hex string".to_string(),
				});
			}
			if let Some(expected) = bytes {
				if digits.len() != expected * 2 {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!(
							"expected {} bytes, got {}",
							expected,
							digits.len() / 2
						),
					});
				}
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| type_mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(type_mismatch(field_name, "boolean", value));
			}
		},
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| type_mismatch(field_name, "array", value))?;

			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		},
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn key_schema() -> Schema {
		Schema::new(
			vec![Field::new(
				"private_key",
				FieldType::HexString { bytes: Some(32) },
			)],
			vec![Field::new(
				"max_attempts",
				FieldType::Integer {
					min: Some(1),
					max: Some(10),
				},
			)],
		)
	}

	#[test]
	fn test_missing_required_field() {
		let config: toml::Value = toml::from_str("max_attempts = 3").unwrap();
		let err = key_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "private_key"));
	}

	#[test]
	fn test_hex_length_enforced() {
		let config: toml::Value = toml::from_str("private_key = \"0xabcd\"").unwrap();
		let err = key_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("expected 32 bytes"));
	}

	#[test]
	fn test_hex_digits_enforced() {
		let config: toml::Value =
			toml::from_str(&format!("private_key = \"{}\"", "zz".repeat(32))).unwrap();
		let err = key_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("not a valid hex string"));
	}

	#[test]
	fn test_integer_bounds() {
		let config: toml::Value = toml::from_str(&format!(
			"private_key = \"{}\"\nmax_attempts = 11",
			"ab".repeat(32)
		))
		.unwrap();
		let err = key_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("greater than maximum"));
	}

	#[test]
	fn test_valid_config_with_validator() {
		let schema = Schema::new(
			vec![Field::new("name", FieldType::String)
				.with_validator(|v| match v.as_str() {
					Some("") => Err("must not be empty".to_string()),
					_ => Ok(()),
				})],
			vec![],
		);
		let ok: toml::Value = toml::from_str("name = \"local\"").unwrap();
		assert!(schema.validate(&ok).is_ok());
		let empty: toml::Value = toml::from_str("name = \"\"").unwrap();
		assert!(schema.validate(&empty).is_err());
	}
}
