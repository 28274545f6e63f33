//! Constructor, field and method injection

use super::{InstantiationPlan, InstantiationStrategy, MemberStep};
use crate::component::{ComponentDescriptor, ConstructorPoint};
use crate::error::{DiError, DiResult};
use crate::marker::{Inject, NoFieldScan, PostConstruct};
use tracing::debug;

/// What to do with `@Inject` on a static field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaticFieldPolicy {
	#[default]
	Reject,
	/// Static fields are assigned like instance fields.
	Allow,
}

/// Builds types through their `@Inject` constructor, or through a
/// no-argument constructor followed by `@Inject` fields and methods.
///
/// Types without any `@Inject` or `@PostConstruct` marker are left to the
/// [`FallbackStrategy`](super::FallbackStrategy).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStrategy {
	static_fields: StaticFieldPolicy,
}

impl StandardStrategy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_static_fields(mut self, policy: StaticFieldPolicy) -> Self {
		self.static_fields = policy;
		self
	}

	pub fn static_field_policy(&self) -> StaticFieldPolicy {
		self.static_fields
	}

	fn has_member_injection(component: &ComponentDescriptor) -> bool {
		component.levels().iter().any(|level| {
			level.fields().iter().any(|f| f.is_marked::<Inject>())
				|| level.methods().iter().any(|m| m.is_marked::<Inject>())
		})
	}

	fn constructor_plan(
		component: &ComponentDescriptor,
		constructor: &ConstructorPoint,
	) -> InstantiationPlan {
		InstantiationPlan::constructor(
			component.key(),
			constructor.params().to_vec(),
			constructor.construct_fn(),
		)
	}

	fn member_plan(
		&self,
		component: &ComponentDescriptor,
		no_arg: &ConstructorPoint,
		scan_members: bool,
	) -> DiResult<InstantiationPlan> {
		let mut dependencies = Vec::new();
		let mut declared_by = Vec::new();
		let mut steps = Vec::new();

		// Most distant ancestor first; declaration order within a level.
		for level in component.levels().iter().rev().filter(|_| scan_members) {
			for field in level.fields().iter().filter(|f| f.is_marked::<Inject>()) {
				if field.is_static() && self.static_fields == StaticFieldPolicy::Reject {
					return Err(DiError::validation(
						level.key(),
						format!(
							"@Inject may not be placed on static fields (field `{}`)",
							field.name()
						),
					));
				}
				if !field.is_mutable() {
					return Err(DiError::validation(
						level.key(),
						format!("@Inject fields may not be final (field `{}`)", field.name()),
					));
				}
				dependencies.push(field.dependency().clone());
				declared_by.push(level.key());
				steps.push(MemberStep {
					arity: 1,
					apply: field.apply_fn(),
				});
			}

			for method in level.methods().iter().filter(|m| m.is_marked::<Inject>()) {
				if method.is_static() {
					return Err(DiError::validation(
						level.key(),
						format!(
							"@Inject may not be placed on static methods (method `{}`)",
							method.name()
						),
					));
				}
				dependencies.extend(method.params().iter().cloned());
				declared_by.extend(method.params().iter().map(|_| level.key()));
				steps.push(MemberStep {
					arity: method.params().len(),
					apply: method.apply_fn(),
				});
			}
		}

		Ok(InstantiationPlan::members(
			component.key(),
			dependencies,
			declared_by,
			no_arg.construct_fn(),
			steps,
		))
	}
}

impl InstantiationStrategy for StandardStrategy {
	fn try_get(&self, component: &ComponentDescriptor) -> DiResult<Option<InstantiationPlan>> {
		if !component.is_marked_anywhere::<Inject>()
			&& !component.is_marked_anywhere::<PostConstruct>()
		{
			return Ok(None);
		}

		let mut injected = component
			.constructors()
			.iter()
			.filter(|c| c.is_marked::<Inject>());
		let constructor = injected.next();
		if injected.next().is_some() {
			return Err(DiError::validation(
				component.key(),
				"Class may not have multiple @Inject constructors",
			));
		}

		let scan_members = !component.has_marker::<NoFieldScan>();
		let member_injection = scan_members && Self::has_member_injection(component);

		if let Some(constructor) = constructor {
			if member_injection {
				return Err(DiError::validation(
					component.key(),
					"Class may not have @Inject constructor and @Inject fields. Use either one or the other",
				));
			}
			debug!(
				target_type = component.key().name(),
				dependencies = constructor.params().len(),
				"selected constructor injection"
			);
			return Ok(Some(Self::constructor_plan(component, constructor)));
		}

		let Some(no_arg) = component
			.constructors()
			.iter()
			.find(|c| c.params().is_empty())
		else {
			return Ok(None);
		};

		let plan = self.member_plan(component, no_arg, scan_members)?;
		debug!(
			target_type = component.key().name(),
			dependencies = plan.dependencies().len(),
			"selected field injection"
		);
		Ok(Some(plan))
	}
}
