//! Dependency descriptors and resolution results

use crate::key::TypeKey;
use crate::marker::{AnyMarker, Inject, Marker};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A resolved, type-erased dependency value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Description of one value a type needs in order to be constructed:
/// its declared type and the markers attached to the declaration, in
/// declaration order.
#[derive(Clone)]
pub struct DependencyDescriptor {
	ty: TypeKey,
	markers: Arc<[AnyMarker]>,
}

impl DependencyDescriptor {
	pub fn new(ty: TypeKey, markers: impl IntoIterator<Item = AnyMarker>) -> Self {
		Self {
			ty,
			markers: markers.into_iter().collect(),
		}
	}

	/// Descriptor for a plain, unmarked dependency on `T`.
	pub fn of<T: ?Sized + Any>() -> Self {
		Self::new(TypeKey::of::<T>(), [])
	}

	pub fn ty(&self) -> TypeKey {
		self.ty
	}

	pub fn markers(&self) -> &[AnyMarker] {
		&self.markers
	}

	/// First marker of type `M`, if any.
	pub fn marker<M: Marker>(&self) -> Option<&M> {
		self.markers.iter().find_map(AnyMarker::downcast_ref::<M>)
	}

	pub fn has_marker<M: Marker>(&self) -> bool {
		self.markers.iter().any(AnyMarker::is::<M>)
	}

	/// Whether the descriptor carries any marker besides [`Inject`].
	pub fn is_qualified(&self) -> bool {
		self.markers.iter().any(|m| !m.is::<Inject>())
	}
}

impl fmt::Debug for DependencyDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DependencyDescriptor")
			.field("ty", &self.ty.name())
			.field("markers", &self.markers)
			.finish()
	}
}

/// Outcome of resolving a dependency.
#[derive(Clone)]
pub enum Resolution {
	/// A value for the dependency.
	Value(Value),
	/// The resolver asserts that the dependency may stay empty.
	Absent,
}

impl Resolution {
	/// Wraps `value` as a resolved dependency.
	///
	/// # Examples
	///
	/// ```
	/// use keel_di::Resolution;
	///
	/// let resolution = Resolution::of(-112i32);
	/// assert_eq!(resolution.downcast_ref::<i32>(), Some(&-112));
	/// ```
	pub fn of<T: Any + Send + Sync>(value: T) -> Self {
		Resolution::Value(Arc::new(value))
	}

	pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
		Resolution::Value(value)
	}

	pub fn is_absent(&self) -> bool {
		matches!(self, Resolution::Absent)
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Resolution::Value(value) => value.downcast_ref::<T>(),
			Resolution::Absent => None,
		}
	}
}

impl fmt::Debug for Resolution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Resolution::Value(_) => f.write_str("Resolution::Value(..)"),
			Resolution::Absent => f.write_str("Resolution::Absent"),
		}
	}
}

/// Why a value is being requested: the dependency, the type that declared
/// it, the type being built and the dependency's position in the plan.
///
/// The declaring type differs from the target type for fields and methods
/// inherited from an ancestry level.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
	dependency: &'a DependencyDescriptor,
	declaring_type: TypeKey,
	target_type: TypeKey,
	position: usize,
}

impl<'a> ResolutionContext<'a> {
	/// A context whose dependency is declared by the type being built.
	pub fn new(dependency: &'a DependencyDescriptor, declaring_type: TypeKey, position: usize) -> Self {
		Self {
			dependency,
			declaring_type,
			target_type: declaring_type,
			position,
		}
	}

	/// Sets the type being built when it is not the declaring type.
	pub fn with_target(mut self, target_type: TypeKey) -> Self {
		self.target_type = target_type;
		self
	}

	pub fn dependency(&self) -> &'a DependencyDescriptor {
		self.dependency
	}

	pub fn declaring_type(&self) -> TypeKey {
		self.declaring_type
	}

	pub fn target_type(&self) -> TypeKey {
		self.target_type
	}

	pub fn position(&self) -> usize {
		self.position
	}
}
