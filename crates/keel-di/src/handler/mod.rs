//! Handler pipeline
//!
//! Handlers plug into resolution at two points: while a dependency is being
//! filled ([`Handler::resolve`]) and once an instance has been built
//! ([`Handler::after_construct`]). The injector tries them in registration
//! order.

mod post_construct;
mod saved;
mod settings;

pub use post_construct::{PostConstructHook, PostConstructInvoker};
pub use saved::SavedMarkersHandler;
pub use settings::{Setting, SettingsHandler};

use crate::component::{ComponentDescriptor, Instance};
use crate::dependency::{Resolution, ResolutionContext};
use crate::error::DiResult;
use crate::key::TypeKey;
use crate::marker::Marker;
use std::sync::Arc;
use tracing::trace;

/// Describes the component whose instance has just been built.
#[derive(Debug, Clone, Copy)]
pub struct ConstructionContext<'a> {
	component: &'a ComponentDescriptor,
}

impl<'a> ConstructionContext<'a> {
	pub fn new(component: &'a ComponentDescriptor) -> Self {
		Self { component }
	}

	pub fn component(&self) -> &'a ComponentDescriptor {
		self.component
	}

	pub fn key(&self) -> TypeKey {
		self.component.key()
	}
}

/// A pluggable unit of the resolution pipeline.
///
/// Both hooks default to "not applicable".
pub trait Handler: Send + Sync {
	/// Supplies a value for a dependency, or `Ok(None)` if the handler does not
	/// apply. A handler that finds its marker misused returns an error.
	fn resolve(&self, _context: &ResolutionContext<'_>) -> DiResult<Option<Resolution>> {
		Ok(None)
	}

	/// Post-processes a freshly built instance. Returning `Some` replaces the
	/// instance handed to later handlers and to the caller.
	fn after_construct(
		&self,
		_instance: &mut Instance,
		_context: &ConstructionContext<'_>,
	) -> DiResult<Option<Instance>> {
		Ok(None)
	}
}

/// A resolver that understands exactly one marker type.
///
/// It is only invoked for dependencies that carry an accepted marker; the
/// first such marker is passed in.
///
/// ```
/// use keel_di::{DiResult, Marker, MarkerHandler, Resolution, ResolutionContext};
///
/// #[derive(Debug)]
/// struct Port;
/// impl Marker for Port {}
///
/// struct PortHandler(u16);
///
/// impl MarkerHandler for PortHandler {
///     type Marker = Port;
///
///     fn resolve_marked(&self, _: &ResolutionContext<'_>, _: &Port) -> DiResult<Option<Resolution>> {
///         Ok(Some(Resolution::of(self.0)))
///     }
/// }
/// ```
pub trait MarkerHandler: Send + Sync {
	type Marker: Marker;

	fn resolve_marked(
		&self,
		context: &ResolutionContext<'_>,
		marker: &Self::Marker,
	) -> DiResult<Option<Resolution>>;

	/// Type check applied to each marker of a dependency.
	fn accepts(&self, marker: TypeKey) -> bool {
		marker == TypeKey::of::<Self::Marker>()
	}
}

impl<H: MarkerHandler> Handler for H {
	fn resolve(&self, context: &ResolutionContext<'_>) -> DiResult<Option<Resolution>> {
		let marker = context
			.dependency()
			.markers()
			.iter()
			.filter(|m| self.accepts(m.key()))
			.find_map(|m| m.downcast_ref::<H::Marker>());
		match marker {
			Some(marker) => self.resolve_marked(context, marker),
			None => Ok(None),
		}
	}
}

/// Ordered list of handlers.
#[derive(Clone, Default)]
pub struct HandlerPipeline {
	handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerPipeline {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, handler: Arc<dyn Handler>) {
		self.handlers.push(handler);
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}

	/// Asks each handler in turn; the first applicable one wins.
	pub fn resolve(&self, context: &ResolutionContext<'_>) -> DiResult<Option<Resolution>> {
		for (index, handler) in self.handlers.iter().enumerate() {
			if let Some(resolution) = handler.resolve(context)? {
				trace!(
					handler = index,
					target_type = context.target_type().name(),
					declaring_type = context.declaring_type().name(),
					position = context.position(),
					"dependency supplied by handler"
				);
				return Ok(Some(resolution));
			}
		}
		Ok(None)
	}

	/// Runs every handler's post-construction hook, threading replacements
	/// through to the next handler.
	pub fn after_construct(
		&self,
		mut instance: Instance,
		context: &ConstructionContext<'_>,
	) -> DiResult<Instance> {
		for handler in &self.handlers {
			if let Some(replacement) = handler.after_construct(&mut instance, context)? {
				instance = replacement;
			}
		}
		Ok(instance)
	}
}
