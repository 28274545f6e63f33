//! Last-resort instantiation through a public no-argument constructor

use super::{InstantiationPlan, InstantiationStrategy};
use crate::component::ComponentDescriptor;
use crate::error::DiResult;
use crate::marker::{Inject, PostConstruct};
use tracing::debug;

/// Instantiates types that have a public no-argument constructor and no
/// `@Inject` or `@PostConstruct` marker on any element at any level.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackStrategy;

impl FallbackStrategy {
	pub fn new() -> Self {
		Self
	}
}

impl InstantiationStrategy for FallbackStrategy {
	fn try_get(&self, component: &ComponentDescriptor) -> DiResult<Option<InstantiationPlan>> {
		if component.is_marked_anywhere::<Inject>() || component.is_marked_anywhere::<PostConstruct>() {
			return Ok(None);
		}

		let no_arg = component
			.constructors()
			.iter()
			.find(|c| c.params().is_empty() && c.is_public());
		Ok(no_arg.map(|constructor| {
			debug!(target_type = component.key().name(), "selected fallback instantiation");
			InstantiationPlan::fallback(component.key(), constructor.construct_fn())
		}))
	}
}
