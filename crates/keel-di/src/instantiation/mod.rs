//! Instantiation strategies and plans
//!
//! A strategy inspects a [`ComponentDescriptor`] and, when it knows how to
//! build the type, returns an [`InstantiationPlan`]: the ordered list of
//! dependencies to resolve and the closure that turns their values into an
//! instance.

mod fallback;
mod standard;

pub use fallback::FallbackStrategy;
pub use standard::{StandardStrategy, StaticFieldPolicy};

use crate::args::Args;
use crate::component::{ApplyFn, ComponentDescriptor, ConstructFn, Instance};
use crate::dependency::{DependencyDescriptor, Resolution};
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use std::fmt;

/// Produces instantiation plans for component types.
///
/// `Ok(None)` means "not applicable" and lets the next strategy try; an error
/// means the type is applicable but declared incorrectly.
pub trait InstantiationStrategy: Send + Sync {
	fn try_get(&self, component: &ComponentDescriptor) -> DiResult<Option<InstantiationPlan>>;
}

/// One step of a member-style plan: a field assignment or injected method
/// call consuming `arity` values.
#[derive(Clone)]
pub(crate) struct MemberStep {
	pub(crate) arity: usize,
	pub(crate) apply: ApplyFn,
}

#[derive(Clone)]
enum Build {
	Constructor(ConstructFn),
	Members {
		construct: ConstructFn,
		steps: Vec<MemberStep>,
	},
	Fallback(ConstructFn),
}

/// Dependencies of a type together with the way to build it from their values.
#[derive(Clone)]
pub struct InstantiationPlan {
	owner: TypeKey,
	dependencies: Vec<DependencyDescriptor>,
	declared_by: Vec<TypeKey>,
	build: Build,
}

impl InstantiationPlan {
	/// A plan that passes all values to a single constructor.
	pub(crate) fn constructor(
		owner: TypeKey,
		dependencies: Vec<DependencyDescriptor>,
		construct: ConstructFn,
	) -> Self {
		Self {
			owner,
			declared_by: vec![owner; dependencies.len()],
			dependencies,
			build: Build::Constructor(construct),
		}
	}

	/// A plan that builds through a no-argument constructor, then hands the
	/// values to each step in turn. `declared_by` names the ancestry level of
	/// each dependency.
	pub(crate) fn members(
		owner: TypeKey,
		dependencies: Vec<DependencyDescriptor>,
		declared_by: Vec<TypeKey>,
		construct: ConstructFn,
		steps: Vec<MemberStep>,
	) -> Self {
		Self {
			owner,
			dependencies,
			declared_by,
			build: Build::Members { construct, steps },
		}
	}

	pub(crate) fn fallback(owner: TypeKey, construct: ConstructFn) -> Self {
		Self {
			owner,
			dependencies: Vec::new(),
			declared_by: Vec::new(),
			build: Build::Fallback(construct),
		}
	}

	/// The type the plan builds.
	pub fn owner(&self) -> TypeKey {
		self.owner
	}

	/// Dependencies in the order `build` expects their values.
	pub fn dependencies(&self) -> &[DependencyDescriptor] {
		&self.dependencies
	}

	/// For each dependency, the type whose declaration introduced it: the
	/// owner for constructor parameters, the ancestry level for inherited
	/// fields and methods.
	pub fn declaring_types(&self) -> &[TypeKey] {
		&self.declared_by
	}

	/// Builds an instance from positionally aligned values.
	///
	/// `None` stands for a missing value and fails with
	/// [`DiError::NullDependency`]; [`Resolution::Absent`] is accepted where a
	/// resolver allowed the dependency to stay empty.
	pub fn build(&self, values: Vec<Option<Resolution>>) -> DiResult<Instance> {
		if self.is_fallback() && !values.is_empty() {
			return Err(DiError::ArgumentCount {
				type_name: self.owner.name(),
				expected: 0,
				actual: values.len(),
			});
		}
		if values.len() != self.dependencies.len() {
			return Err(DiError::ArgumentCount {
				type_name: self.owner.name(),
				expected: self.dependencies.len(),
				actual: values.len(),
			});
		}
		if let Some(position) = values.iter().position(Option::is_none) {
			return Err(DiError::NullDependency {
				type_name: self.owner.name(),
				position,
			});
		}

		self.instantiate(values.into_iter().flatten().collect())
	}

	/// Builds an instance from values that are all known to be present.
	pub fn instantiate(&self, values: Vec<Resolution>) -> DiResult<Instance> {
		let owner = self.owner;
		match &self.build {
			Build::Constructor(construct) => {
				let mut args = Args::new(owner, values);
				let instance = construct(&mut args).map_err(|e| DiError::rethrow(owner, e))?;
				args.finish()?;
				Ok(instance)
			}
			Build::Members { construct, steps } => {
				let mut instance =
					construct(&mut Args::new(owner, Vec::new())).map_err(|e| DiError::rethrow(owner, e))?;
				let mut args = Args::new(owner, values);
				for step in steps {
					let start = args.position();
					(step.apply)(&mut instance, &mut args).map_err(|e| DiError::rethrow(owner, e))?;
					let consumed = args.position() - start;
					if consumed != step.arity {
						return Err(DiError::ArgumentCount {
							type_name: owner.name(),
							expected: step.arity,
							actual: consumed,
						});
					}
				}
				args.finish()?;
				Ok(instance)
			}
			Build::Fallback(construct) => {
				if !values.is_empty() {
					return Err(DiError::ArgumentCount {
						type_name: owner.name(),
						expected: 0,
						actual: values.len(),
					});
				}
				construct(&mut Args::new(owner, values)).map_err(|e| DiError::rethrow(owner, e))
			}
		}
	}

	pub fn is_fallback(&self) -> bool {
		matches!(self.build, Build::Fallback(_))
	}
}

impl fmt::Debug for InstantiationPlan {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self.build {
			Build::Constructor(_) => "constructor",
			Build::Members { .. } => "members",
			Build::Fallback(_) => "fallback",
		};
		f.debug_struct("InstantiationPlan")
			.field("owner", &self.owner.name())
			.field("kind", &kind)
			.field("dependencies", &self.dependencies)
			.finish()
	}
}
