//! Dependency scopes

use crate::dependency::Value;
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Lifetime of a component's instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
	/// Constructed at most once and shared afterwards.
	#[default]
	Singleton,
	/// Constructed afresh for every request.
	Transient,
}

type Slot = Arc<OnceCell<Value>>;

/// Process-wide cache of singleton instances.
///
/// Every type owns one slot which is filled at most once, even when several
/// threads ask for the same type concurrently: late callers block until the
/// first one has finished and then share its instance.
pub struct SingletonScope {
	cache: RwLock<HashMap<TypeId, Slot>>,
}

impl SingletonScope {
	/// Creates a new SingletonScope with an empty cache.
	///
	/// # Examples
	///
	/// ```
	/// use keel_di::SingletonScope;
	///
	/// let scope = SingletonScope::new();
	/// assert!(scope.get::<u64>().is_none());
	/// ```
	pub fn new() -> Self {
		Self {
			cache: RwLock::new(HashMap::new()),
		}
	}

	/// Retrieves a singleton value from the cache by type.
	///
	/// # Examples
	///
	/// ```
	/// use keel_di::SingletonScope;
	///
	/// let scope = SingletonScope::new();
	/// scope.insert(100u64).unwrap();
	///
	/// let value = scope.get::<u64>().unwrap();
	/// assert_eq!(*value, 100);
	/// ```
	pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		self.get_value(TypeKey::of::<T>())
			.and_then(|value| value.downcast::<T>().ok())
	}

	/// Retrieves the type-erased value stored for `key`, if it has been created.
	pub fn get_value(&self, key: TypeKey) -> Option<Value> {
		let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
		cache.get(&key.id()).and_then(|slot| slot.get().cloned())
	}

	pub fn contains(&self, key: TypeKey) -> bool {
		self.get_value(key).is_some()
	}

	/// Stores a singleton value in the cache.
	///
	/// Fails with [`DiError::DuplicateRegistration`] if a value of the same type
	/// is already present.
	///
	/// # Examples
	///
	/// ```
	/// use keel_di::SingletonScope;
	///
	/// let scope = SingletonScope::new();
	/// scope.insert(42i32).unwrap();
	/// assert!(scope.insert(7i32).is_err());
	/// assert_eq!(*scope.get::<i32>().unwrap(), 42);
	/// ```
	pub fn insert<T: Any + Send + Sync>(&self, value: T) -> DiResult<()> {
		self.insert_arc(Arc::new(value))
	}

	/// Stores a pre-wrapped `Arc<T>` in the singleton scope cache.
	pub fn insert_arc<T: Any + Send + Sync>(&self, value: Arc<T>) -> DiResult<()> {
		self.insert_value(TypeKey::of::<T>(), value)
	}

	pub(crate) fn insert_value(&self, key: TypeKey, value: Value) -> DiResult<()> {
		let slot = self.slot(key);
		slot.set(value)
			.map_err(|_| DiError::DuplicateRegistration { key: key.name() })
	}

	/// Returns the value stored for `key`, running `factory` to create it
	/// if no value exists yet.
	///
	/// `factory` runs at most once per key; a failed factory leaves the slot
	/// empty so that a later call may try again.
	pub fn get_or_try_create<F>(&self, key: TypeKey, factory: F) -> DiResult<Value>
	where
		F: FnOnce() -> DiResult<Value>,
	{
		let slot = self.slot(key);
		slot.get_or_try_init(factory).cloned()
	}

	fn slot(&self, key: TypeKey) -> Slot {
		if let Some(slot) = self
			.cache
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&key.id())
		{
			return Arc::clone(slot);
		}
		let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
		Arc::clone(cache.entry(key.id()).or_default())
	}
}

impl Default for SingletonScope {
	fn default() -> Self {
		Self::new()
	}
}
