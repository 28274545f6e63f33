//! Type identity used throughout the container

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a Rust type together with its readable name.
///
/// Equality and hashing only consider the [`TypeId`]; the name is carried
/// along so that errors and logs can say which type was involved.
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	/// Returns the key of `T`.
	///
	/// # Examples
	///
	/// ```
	/// use keel_di::TypeKey;
	///
	/// let key = TypeKey::of::<String>();
	/// assert_eq!(key, TypeKey::of::<String>());
	/// assert_ne!(key, TypeKey::of::<u32>());
	/// ```
	pub fn of<T: ?Sized + Any>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	pub fn id(&self) -> TypeId {
		self.id
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the last path segment of the type name (`Vec<alloc::string::String>` stays intact,
	/// `app::services::Mailer` becomes `Mailer`).
	pub fn short_name(&self) -> &'static str {
		if self.name.contains('<') {
			return self.name;
		}
		self.name.rsplit("::").next().unwrap_or(self.name)
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl PartialOrd for TypeKey {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for TypeKey {
	fn cmp(&self, other: &Self) -> Ordering {
		if self.id == other.id {
			return Ordering::Equal;
		}
		self.name
			.cmp(other.name)
			.then_with(|| self.id.cmp(&other.id))
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeKey({})", self.name)
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}
