//! Literal configuration values

use super::MarkerHandler;
use crate::dependency::{Resolution, ResolutionContext, Value};
use crate::error::{DiError, DiResult};
use crate::marker::Marker;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Requests the configuration value stored under the given key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setting(pub &'static str);

impl Marker for Setting {}

/// Resolves dependencies marked with [`Setting`] from a key-value table.
///
/// A missing key, or a value whose type differs from the dependency's
/// declared type, is a configuration error rather than "not applicable".
#[derive(Default)]
pub struct SettingsHandler {
	values: HashMap<String, Value>,
}

impl SettingsHandler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with<V: Any + Send + Sync>(mut self, key: impl Into<String>, value: V) -> Self {
		self.insert(key, value);
		self
	}

	/// Stores `value` under `key`, replacing any previous value.
	pub fn insert<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V) {
		self.values.insert(key.into(), Arc::new(value));
	}

	/// Reads a TOML document. Nested tables become dotted keys; integers are
	/// stored as `i64`, floats as `f64`, strings as `String`, booleans as `bool`.
	///
	/// # Examples
	///
	/// ```
	/// use keel_di::SettingsHandler;
	///
	/// let settings = SettingsHandler::from_toml_str(
	///     r#"
	///     [server]
	///     port = 8080
	///     name = "keel"
	///     "#,
	/// )
	/// .unwrap();
	///
	/// assert!(settings.contains("server.port"));
	/// assert!(settings.contains("server.name"));
	/// ```
	pub fn from_toml_str(document: &str) -> DiResult<Self> {
		let table: toml::Table = toml::from_str(document)?;
		let mut handler = Self::new();
		handler.load_table("", table);
		Ok(handler)
	}

	fn load_table(&mut self, prefix: &str, table: toml::Table) {
		for (key, value) in table {
			let key = if prefix.is_empty() {
				key
			} else {
				format!("{prefix}.{key}")
			};
			match value {
				toml::Value::Table(nested) => self.load_table(&key, nested),
				toml::Value::String(s) => self.insert(key, s),
				toml::Value::Integer(i) => self.insert(key, i),
				toml::Value::Float(f) => self.insert(key, f),
				toml::Value::Boolean(b) => self.insert(key, b),
				toml::Value::Datetime(d) => self.insert(key, d.to_string()),
				toml::Value::Array(items) => self.insert(key, items),
			}
		}
	}

	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

impl MarkerHandler for SettingsHandler {
	type Marker = Setting;

	fn resolve_marked(
		&self,
		context: &ResolutionContext<'_>,
		marker: &Setting,
	) -> DiResult<Option<Resolution>> {
		let declaring = context.declaring_type();
		let Some(value) = self.values.get(marker.0) else {
			return Err(DiError::validation(
				declaring,
				format!("No setting `{}` for dependency #{}", marker.0, context.position()),
			));
		};

		let expected = context.dependency().ty();
		if (**value).type_id() != expected.id() {
			return Err(DiError::validation(
				declaring,
				format!(
					"Setting `{}` cannot be assigned to dependency #{} of type {}",
					marker.0,
					context.position(),
					expected.name()
				),
			));
		}

		trace!(setting = marker.0, target_type = declaring.name(), "resolved setting");
		Ok(Some(Resolution::Value(Arc::clone(value))))
	}
}
