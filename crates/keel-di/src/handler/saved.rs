//! Values registered per marker type

use super::Handler;
use crate::dependency::{Resolution, ResolutionContext, Value};
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::marker::Marker;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Resolves dependencies from values registered under a marker type.
///
/// A dependency is resolved with the value saved for the first of its
/// markers that has one. Each marker type can be registered once.
#[derive(Default)]
pub struct SavedMarkersHandler {
	values: RwLock<HashMap<TypeKey, Value>>,
}

impl SavedMarkersHandler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Saves `value` for dependencies marked with `M`.
	///
	/// # Examples
	///
	/// ```
	/// use keel_di::{Marker, SavedMarkersHandler};
	///
	/// #[derive(Debug)]
	/// struct Duration;
	/// impl Marker for Duration {}
	///
	/// let handler = SavedMarkersHandler::new();
	/// handler.register::<Duration, _>(19i64).unwrap();
	/// assert!(handler.register::<Duration, _>(20i64).is_err());
	/// ```
	pub fn register<M: Marker, V: Any + Send + Sync>(&self, value: V) -> DiResult<()> {
		self.register_arc::<M>(Arc::new(value))
	}

	pub fn register_arc<M: Marker>(&self, value: Value) -> DiResult<()> {
		let key = TypeKey::of::<M>();
		let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
		if values.contains_key(&key) {
			return Err(DiError::DuplicateRegistration { key: key.name() });
		}
		debug!(marker = key.name(), "saved value for marker");
		values.insert(key, value);
		Ok(())
	}

	pub fn contains<M: Marker>(&self) -> bool {
		self.values
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.contains_key(&TypeKey::of::<M>())
	}
}

impl Handler for SavedMarkersHandler {
	fn resolve(&self, context: &ResolutionContext<'_>) -> DiResult<Option<Resolution>> {
		let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
		Ok(context
			.dependency()
			.markers()
			.iter()
			.find_map(|marker| values.get(&marker.key()))
			.map(|value| Resolution::Value(Arc::clone(value))))
	}
}
