//! Post-construction hooks
//!
//! Each level of a component's ancestry may declare one parameterless,
//! unit-returning instance method marked with [`PostConstruct`]. The hooks
//! run once the instance is fully built, the most distant ancestor first.

use super::{ConstructionContext, Handler};
use crate::args::Args;
use crate::component::{ApplyFn, ComponentDescriptor, Instance};
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::marker::PostConstruct;
use std::fmt;
use tracing::trace;

/// A validated post-construction method.
#[derive(Clone)]
pub struct PostConstructHook {
	declaring_type: TypeKey,
	name: &'static str,
	apply: ApplyFn,
}

impl PostConstructHook {
	/// The type whose level declares the method.
	pub fn declaring_type(&self) -> TypeKey {
		self.declaring_type
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl fmt::Debug for PostConstructHook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}::{}", self.declaring_type.short_name(), self.name)
	}
}

/// Finds, validates and runs `@PostConstruct` methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostConstructInvoker;

impl PostConstructInvoker {
	pub fn new() -> Self {
		Self
	}

	/// The hook table of `component`, in invocation order.
	pub fn hooks_for(&self, component: &ComponentDescriptor) -> DiResult<Vec<PostConstructHook>> {
		let mut hooks = Vec::new();
		for level in component.levels() {
			let mut found: Option<PostConstructHook> = None;
			for method in level.methods().iter().filter(|m| m.is_marked::<PostConstruct>()) {
				if found.is_some() {
					return Err(DiError::validation(
						level.key(),
						format!("Multiple methods with @PostConstruct in {}", level.key()),
					));
				}
				if !method.params().is_empty() || method.is_static() {
					return Err(DiError::validation(
						level.key(),
						format!(
							"@PostConstruct method may not be static or have any parameters. Invalid method in {}",
							level.key()
						),
					));
				}
				if method.returns().is_some() {
					return Err(DiError::validation(
						level.key(),
						format!(
							"@PostConstruct method must have return type void. Offending class: {}",
							level.key()
						),
					));
				}
				found = Some(PostConstructHook {
					declaring_type: level.key(),
					name: method.name(),
					apply: method.apply_fn(),
				});
			}
			hooks.extend(found);
		}
		hooks.reverse();
		Ok(hooks)
	}

	/// Runs the hooks of `component` on `instance`.
	pub fn invoke(&self, instance: &mut Instance, component: &ComponentDescriptor) -> DiResult<()> {
		let owner = component.key();
		for hook in self.hooks_for(component)? {
			trace!(
				target_type = owner.name(),
				hook = ?hook,
				"invoking post-construct hook"
			);
			let mut args = Args::new(owner, Vec::new());
			(hook.apply)(instance, &mut args).map_err(|e| DiError::rethrow(owner, e))?;
		}
		Ok(())
	}
}

impl Handler for PostConstructInvoker {
	fn after_construct(
		&self,
		instance: &mut Instance,
		context: &ConstructionContext<'_>,
	) -> DiResult<Option<Instance>> {
		self.invoke(instance, context.component())?;
		Ok(None)
	}
}
