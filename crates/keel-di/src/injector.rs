//! The resolution engine
//!
//! An [`Injector`] owns the registered component tables, the instantiation
//! strategies, the handler pipeline and the singleton scope. Resolving a type
//! selects a plan, resolves every dependency depth-first, builds the
//! instance, lets the handlers finish it and caches it when the type is a
//! singleton.

use crate::component::{ComponentDescriptor, Instance};
use crate::cycle_detection::{ConstructionGraph, begin_resolution, with_cycle_detection_scope};
use crate::dependency::{Resolution, ResolutionContext, Value};
use crate::error::{DiError, DiResult};
use crate::handler::{ConstructionContext, Handler, HandlerPipeline, PostConstructInvoker};
use crate::instantiation::{
	FallbackStrategy, InstantiationPlan, InstantiationStrategy, StandardStrategy,
};
use crate::key::TypeKey;
use crate::scope::{Scope, SingletonScope};
use crate::settings::InjectorSettings;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Builder for an [`Injector`].
///
/// Custom strategies are tried before the standard and fallback strategies;
/// handlers are consulted after the built-in post-construct invoker, in the
/// order they were added.
#[derive(Default)]
pub struct InjectorBuilder {
	settings: InjectorSettings,
	components: Vec<ComponentDescriptor>,
	handlers: Vec<Arc<dyn Handler>>,
	strategies: Vec<Arc<dyn InstantiationStrategy>>,
	provided: Vec<(TypeKey, Value)>,
}

impl InjectorBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_settings(mut self, settings: InjectorSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn register(mut self, component: ComponentDescriptor) -> Self {
		self.components.push(component);
		self
	}

	pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
		self.handlers.push(Arc::new(handler));
		self
	}

	pub fn handler_arc(mut self, handler: Arc<dyn Handler>) -> Self {
		self.handlers.push(handler);
		self
	}

	pub fn strategy(mut self, strategy: impl InstantiationStrategy + 'static) -> Self {
		self.strategies.push(Arc::new(strategy));
		self
	}

	/// Supplies a ready-made singleton of type `T`.
	pub fn provide<T: Any + Send + Sync>(mut self, value: T) -> Self {
		self.provided.push((TypeKey::of::<T>(), Arc::new(value)));
		self
	}

	/// Validates every registered component and builds the injector.
	///
	/// Fails with the first declaration error found: duplicate registrations,
	/// strategy validation errors, types no strategy can build and invalid
	/// post-construct methods.
	pub fn build(self) -> DiResult<Injector> {
		let mut strategies = self.strategies;
		strategies.push(Arc::new(
			StandardStrategy::new().with_static_fields(self.settings.static_field_policy()),
		));
		if self.settings.fallback_instantiation {
			strategies.push(Arc::new(FallbackStrategy::new()));
		}

		let mut handlers = HandlerPipeline::new();
		handlers.push(Arc::new(PostConstructInvoker::new()));
		for handler in self.handlers {
			handlers.push(handler);
		}

		let singletons = Arc::new(SingletonScope::new());
		for (key, value) in self.provided {
			singletons.insert_value(key, value)?;
		}

		let mut injector = Injector {
			settings: self.settings,
			components: HashMap::with_capacity(self.components.len()),
			strategies,
			handlers,
			singletons,
			graph: ConstructionGraph::new(),
		};

		for component in self.components {
			let key = component.key();
			if injector.components.contains_key(&key.id()) {
				return Err(DiError::DuplicateRegistration { key: key.name() });
			}
			injector.select_plan(&component)?;
			PostConstructInvoker::new().hooks_for(&component)?;
			debug!(
				target_type = key.name(),
				scope = ?component.scope(),
				"registered component"
			);
			injector.components.insert(key.id(), component);
		}

		Ok(injector)
	}
}

/// Resolves registered components and their dependencies.
///
/// # Examples
///
/// ```
/// use keel_di::{ComponentDescriptor, Constructor, Injector};
/// use std::sync::Arc;
///
/// struct Repository;
///
/// struct Service {
///     repository: Arc<Repository>,
/// }
///
/// let injector = Injector::builder()
///     .register(
///         ComponentDescriptor::builder::<Repository>()
///             .constructor(Constructor::new(|_| Ok(Repository)))
///             .build(),
///     )
///     .register(
///         ComponentDescriptor::builder::<Service>()
///             .constructor(
///                 Constructor::inject(|args| {
///                     Ok(Service {
///                         repository: args.take()?,
///                     })
///                 })
///                 .param::<Repository>(),
///             )
///             .build(),
///     )
///     .build()
///     .unwrap();
///
/// let service = injector.get_singleton::<Service>().unwrap();
/// let repository = injector.get_singleton::<Repository>().unwrap();
/// assert!(Arc::ptr_eq(&service.repository, &repository));
/// ```
pub struct Injector {
	settings: InjectorSettings,
	components: HashMap<TypeId, ComponentDescriptor>,
	strategies: Vec<Arc<dyn InstantiationStrategy>>,
	handlers: HandlerPipeline,
	singletons: Arc<SingletonScope>,
	graph: ConstructionGraph,
}

impl Injector {
	pub fn builder() -> InjectorBuilder {
		InjectorBuilder::new()
	}

	pub fn settings(&self) -> &InjectorSettings {
		&self.settings
	}

	pub fn singleton_scope(&self) -> &Arc<SingletonScope> {
		&self.singletons
	}

	pub fn is_registered(&self, key: TypeKey) -> bool {
		self.components.contains_key(&key.id())
	}

	pub fn component(&self, key: TypeKey) -> Option<&ComponentDescriptor> {
		self.components.get(&key.id())
	}

	/// Supplies a ready-made singleton of type `T`. Each type can be provided
	/// once, and not after an instance of it has been created.
	pub fn provide<T: Any + Send + Sync>(&self, value: T) -> DiResult<()> {
		self.singletons.insert(value)
	}

	/// Returns the shared instance of `T`, creating it on first use.
	pub fn get_singleton<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
		let key = TypeKey::of::<T>();
		downcast_value(key, self.singleton_value(key)?)
	}

	/// Builds a fresh instance of `T` that is not cached. Its dependencies
	/// are resolved according to their own scopes.
	pub fn new_instance<T: Any + Send + Sync>(&self) -> DiResult<T> {
		let key = TypeKey::of::<T>();
		let instance = self.fresh_instance(key)?;
		instance
			.downcast::<T>()
			.map(|boxed| *boxed)
			.map_err(|_| mismatched_instance(key))
	}

	/// Returns an instance of `T` according to the scope it was registered with.
	pub fn resolve<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
		let key = TypeKey::of::<T>();
		downcast_value(key, self.scoped_value(key)?)
	}

	/// The plan the injector would use to build the type registered under `key`.
	pub fn instantiation_plan(&self, key: TypeKey) -> DiResult<InstantiationPlan> {
		self.select_plan(self.registered(key)?)
	}

	fn registered(&self, key: TypeKey) -> DiResult<&ComponentDescriptor> {
		self.components
			.get(&key.id())
			.ok_or(DiError::NoInstantiation {
				type_name: key.name(),
			})
	}

	fn select_plan(&self, component: &ComponentDescriptor) -> DiResult<InstantiationPlan> {
		for strategy in &self.strategies {
			if let Some(plan) = strategy.try_get(component)? {
				return Ok(plan);
			}
		}
		Err(DiError::NoInstantiation {
			type_name: component.key().name(),
		})
	}

	fn scoped_value(&self, key: TypeKey) -> DiResult<Value> {
		match self.components.get(&key.id()).map(ComponentDescriptor::scope) {
			Some(Scope::Transient) => self.fresh_instance(key).map(Value::from),
			_ => self.singleton_value(key),
		}
	}

	fn singleton_value(&self, key: TypeKey) -> DiResult<Value> {
		with_cycle_detection_scope(self.settings.max_resolution_depth, || {
			if let Some(value) = self.singletons.get_value(key) {
				return Ok(value);
			}
			let component = self.registered(key)?;
			let _guard = begin_resolution(key)?;
			let _waiting = self.graph.wait_for(key)?;
			self.singletons.get_or_try_create(key, || {
				let _claim = self.graph.claim(key);
				let instance = self.construct(component)?;
				debug!(target_type = key.name(), "created singleton");
				Ok(Value::from(instance))
			})
		})
	}

	fn fresh_instance(&self, key: TypeKey) -> DiResult<Instance> {
		with_cycle_detection_scope(self.settings.max_resolution_depth, || {
			let component = self.registered(key)?;
			let _guard = begin_resolution(key)?;
			self.construct(component)
		})
	}

	fn construct(&self, component: &ComponentDescriptor) -> DiResult<Instance> {
		let owner = component.key();
		let plan = self.select_plan(component)?;

		let mut values = Vec::with_capacity(plan.dependencies().len());
		let declared = plan.dependencies().iter().zip(plan.declaring_types());
		for (position, (dependency, declaring)) in declared.enumerate() {
			let context = ResolutionContext::new(dependency, *declaring, position).with_target(owner);
			values.push(self.resolve_dependency(&context)?);
		}

		let instance = plan.instantiate(values)?;
		let instance = self
			.handlers
			.after_construct(instance, &ConstructionContext::new(component))?;
		// Handlers may replace the instance; anything but the owner type must
		// not reach a cache slot.
		if (*instance).type_id() != owner.id() {
			return Err(mismatched_instance(owner));
		}
		Ok(instance)
	}

	fn resolve_dependency(&self, context: &ResolutionContext<'_>) -> DiResult<Resolution> {
		if let Some(resolution) = self.handlers.resolve(context)? {
			return Ok(resolution);
		}

		let dependency = context.dependency();
		let (owner, position) = (context.target_type(), context.position());
		let ty = dependency.ty();
		trace!(
			target_type = owner.name(),
			position,
			dependency = ty.name(),
			"resolving dependency by type"
		);
		if self.singletons.contains(ty) || self.is_registered(ty) {
			return self.scoped_value(ty).map(Resolution::Value);
		}

		debug!(
			target_type = owner.name(),
			declaring_type = context.declaring_type().name(),
			position,
			dependency = ty.name(),
			markers = ?dependency.markers(),
			"dependency injection resolution failed"
		);
		Err(DiError::Unresolvable {
			type_name: owner.name(),
			position,
			dependency: ty.name(),
		})
	}
}

impl fmt::Debug for Injector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut registered: Vec<&str> = self.components.values().map(|c| c.key().name()).collect();
		registered.sort_unstable();
		f.debug_struct("Injector")
			.field("settings", &self.settings)
			.field("components", &registered)
			.field("strategies", &self.strategies.len())
			.field("handlers", &self.handlers.len())
			.finish()
	}
}

fn mismatched_instance(key: TypeKey) -> DiError {
	DiError::Instantiation {
		type_name: key.name(),
		source: format!("handlers replaced the instance with a value that is not a {key}").into(),
	}
}

fn downcast_value<T: Any + Send + Sync>(key: TypeKey, value: Value) -> DiResult<Arc<T>> {
	value.downcast::<T>().map_err(|_| mismatched_instance(key))
}
