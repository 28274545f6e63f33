//! # Keel DI extras
//!
//! Resolvers that need knowledge beyond a single component declaration.
//!
//! [`AllTypesHandler`] fills dependencies marked with [`AllTypes`] with every
//! known subtype of a given supertype, as reported by a [`TypeCatalog`]:
//!
//! ```
//! use keel_di::{ComponentDescriptor, Constructor, Injector, TypeKey};
//! use keel_di_extras::{AllTypes, AllTypesHandler, InMemoryTypeCatalog};
//! use std::collections::BTreeSet;
//!
//! trait Animal {}
//! struct Cat;
//! struct Dog;
//!
//! struct Zoo {
//!     species: BTreeSet<TypeKey>,
//! }
//!
//! let catalog = InMemoryTypeCatalog::new()
//!     .with_subtype::<dyn Animal, Cat>()
//!     .with_subtype::<dyn Animal, Dog>();
//!
//! let injector = Injector::builder()
//!     .handler(AllTypesHandler::new(catalog))
//!     .register(
//!         ComponentDescriptor::builder::<Zoo>()
//!             .constructor(
//!                 Constructor::inject(|args| Ok(Zoo { species: args.take_cloned()? }))
//!                     .param_with::<BTreeSet<TypeKey>>(AllTypes::of::<dyn Animal>()),
//!             )
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(injector.get_singleton::<Zoo>().unwrap().species.len(), 2);
//! ```

use keel_di::{DiError, DiResult, Marker, MarkerHandler, Resolution, ResolutionContext, TypeKey};
use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Requests all known subtypes of a supertype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllTypes {
	supertype: Option<TypeKey>,
}

impl AllTypes {
	pub fn of<S: ?Sized + Any>() -> Self {
		Self {
			supertype: Some(TypeKey::of::<S>()),
		}
	}

	/// A marker without a supertype. Resolving it is an error.
	pub fn unset() -> Self {
		Self { supertype: None }
	}

	pub fn supertype(&self) -> Option<TypeKey> {
		self.supertype
	}
}

impl Marker for AllTypes {}

/// Source of subtype relations.
pub trait TypeCatalog: Send + Sync {
	/// Every known subtype of `supertype`, directly or transitively.
	fn subtypes_of(&self, supertype: TypeKey) -> Vec<TypeKey>;
}

/// A [`TypeCatalog`] filled by hand.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTypeCatalog {
	direct: HashMap<TypeKey, BTreeSet<TypeKey>>,
}

impl InMemoryTypeCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_subtype<S: ?Sized + Any, T: ?Sized + Any>(mut self) -> Self {
		self.register(TypeKey::of::<S>(), TypeKey::of::<T>());
		self
	}

	pub fn register(&mut self, supertype: TypeKey, subtype: TypeKey) {
		self.direct.entry(supertype).or_default().insert(subtype);
	}
}

impl TypeCatalog for InMemoryTypeCatalog {
	fn subtypes_of(&self, supertype: TypeKey) -> Vec<TypeKey> {
		let mut found = BTreeSet::new();
		let mut pending = vec![supertype];
		while let Some(current) = pending.pop() {
			for subtype in self.direct.get(&current).into_iter().flatten() {
				if *subtype != supertype && found.insert(*subtype) {
					pending.push(*subtype);
				}
			}
		}
		found.into_iter().collect()
	}
}

/// Resolves [`AllTypes`] dependencies declared as `Vec<TypeKey>`,
/// `BTreeSet<TypeKey>` or `HashSet<TypeKey>`.
pub struct AllTypesHandler<C> {
	catalog: C,
}

impl<C: TypeCatalog> AllTypesHandler<C> {
	pub fn new(catalog: C) -> Self {
		Self { catalog }
	}

	pub fn catalog(&self) -> &C {
		&self.catalog
	}
}

impl<C: TypeCatalog> MarkerHandler for AllTypesHandler<C> {
	type Marker = AllTypes;

	fn resolve_marked(
		&self,
		context: &ResolutionContext<'_>,
		marker: &AllTypes,
	) -> DiResult<Option<Resolution>> {
		let declaring = context.declaring_type();
		let Some(supertype) = marker.supertype() else {
			return Err(DiError::Validation {
				type_name: declaring.name(),
				message: format!(
					"@AllTypes on dependency #{} must name a supertype",
					context.position()
				),
			});
		};

		let subtypes = self.catalog.subtypes_of(supertype);
		debug!(
			supertype = supertype.name(),
			count = subtypes.len(),
			target_type = declaring.name(),
			"collected subtypes"
		);

		let target = context.dependency().ty();
		let resolution = if target == TypeKey::of::<Vec<TypeKey>>() {
			Resolution::of(subtypes)
		} else if target == TypeKey::of::<BTreeSet<TypeKey>>() {
			Resolution::of(subtypes.into_iter().collect::<BTreeSet<_>>())
		} else if target == TypeKey::of::<HashSet<TypeKey>>() {
			Resolution::of(subtypes.into_iter().collect::<HashSet<_>>())
		} else {
			return Err(DiError::Validation {
				type_name: declaring.name(),
				message: format!(
					"@AllTypes dependency #{} has unsupported type {}; expected a Vec, BTreeSet or HashSet of TypeKey",
					context.position(),
					target.name()
				),
			});
		};
		Ok(Some(resolution))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	trait Shape {}
	struct Polygon;
	struct Square;
	struct Circle;

	#[rstest]
	fn test_subtypes_are_transitive() {
		// Arrange
		let catalog = InMemoryTypeCatalog::new()
			.with_subtype::<dyn Shape, Polygon>()
			.with_subtype::<Polygon, Square>()
			.with_subtype::<dyn Shape, Circle>();

		// Act
		let subtypes: BTreeSet<TypeKey> = catalog
			.subtypes_of(TypeKey::of::<dyn Shape>())
			.into_iter()
			.collect();

		// Assert
		let expected: BTreeSet<TypeKey> = [
			TypeKey::of::<Polygon>(),
			TypeKey::of::<Square>(),
			TypeKey::of::<Circle>(),
		]
		.into_iter()
		.collect();
		assert_eq!(subtypes, expected);
		assert!(catalog.subtypes_of(TypeKey::of::<Circle>()).is_empty());
	}
}
