//! Markers attached to injection points
//!
//! A marker plays the role of an annotation: it is attached to a constructor,
//! parameter, field, method or type when the component is declared, and is
//! later inspected by the instantiation strategies and the handler pipeline.

use crate::key::TypeKey;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value that can be attached to a declared element.
///
/// Implement this for qualifier types that resolvers should react to:
///
/// ```
/// use keel_di::{AnyMarker, Marker};
///
/// #[derive(Debug)]
/// struct Size(&'static str);
///
/// impl Marker for Size {}
///
/// let marker = AnyMarker::new(Size("box"));
/// assert_eq!(marker.downcast_ref::<Size>().map(|s| s.0), Some("box"));
/// ```
pub trait Marker: Any + Send + Sync + fmt::Debug {}

/// Declares an injection point (constructor, field or method).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Inject;

impl Marker for Inject {}

/// Declares an initialization hook to run once the object has been built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostConstruct;

impl Marker for PostConstruct {}

/// Opts a type out of field and method injection entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoFieldScan;

impl Marker for NoFieldScan {}

/// Type-erased marker.
#[derive(Clone)]
pub struct AnyMarker {
	key: TypeKey,
	inner: Arc<dyn Any + Send + Sync>,
	repr: Arc<str>,
}

impl AnyMarker {
	pub fn new<M: Marker>(marker: M) -> Self {
		Self {
			key: TypeKey::of::<M>(),
			repr: format!("{marker:?}").into(),
			inner: Arc::new(marker),
		}
	}

	/// Key of the concrete marker type.
	pub fn key(&self) -> TypeKey {
		self.key
	}

	pub fn is<M: Marker>(&self) -> bool {
		self.key == TypeKey::of::<M>()
	}

	pub fn downcast_ref<M: Marker>(&self) -> Option<&M> {
		self.inner.downcast_ref::<M>()
	}
}

impl<M: Marker> From<M> for AnyMarker {
	fn from(marker: M) -> Self {
		Self::new(marker)
	}
}

impl fmt::Debug for AnyMarker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "@{}", self.repr)
	}
}

/// Returns whether any of `markers` is of type `M`.
pub(crate) fn has_marker<M: Marker>(markers: &[AnyMarker]) -> bool {
	markers.iter().any(AnyMarker::is::<M>)
}
