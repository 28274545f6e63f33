//! Component declaration tables
//!
//! Rust has no runtime reflection over constructors, fields and annotations,
//! so every component declares its injection points explicitly. The typed
//! builders in this module capture the closures that construct and wire an
//! instance, together with the markers attached to each element, and erase
//! them into a [`ComponentDescriptor`] once at registration time.
//!
//! Inheritance is expressed as an ordered list of levels: level 0 holds the
//! elements declared by the type itself, each [`ComponentBuilder::parent`]
//! call appends the next ancestor.
//!
//! ```
//! use keel_di::{Constructor, ComponentDescriptor, Field, Method};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Clock;
//!
//! #[derive(Default)]
//! struct Scheduler {
//!     clock: Option<Arc<Clock>>,
//!     started: bool,
//! }
//!
//! let descriptor = ComponentDescriptor::builder::<Scheduler>()
//!     .constructor(Constructor::new(|_| Ok(Scheduler::default())))
//!     .field(Field::inject("clock", |s: &mut Scheduler, clock: Arc<Clock>| s.clock = Some(clock)))
//!     .method(Method::post_construct("start", |s: &mut Scheduler| {
//!         s.started = true;
//!         Ok(())
//!     }))
//!     .build();
//!
//! assert_eq!(descriptor.levels().len(), 1);
//! ```

use crate::args::Args;
use crate::dependency::DependencyDescriptor;
use crate::error::BoxError;
use crate::key::TypeKey;
use crate::marker::{AnyMarker, Inject, Marker, NoFieldScan, PostConstruct, has_marker};
use crate::scope::Scope;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// An instance under construction.
pub type Instance = Box<dyn Any + Send + Sync>;

pub(crate) type ConstructFn = Arc<dyn Fn(&mut Args) -> Result<Instance, BoxError> + Send + Sync>;
pub(crate) type ApplyFn =
	Arc<dyn Fn(&mut Instance, &mut Args) -> Result<(), BoxError> + Send + Sync>;

/// Accessibility of a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
	Public,
	Private,
}

fn instance_mut<T: Any>(instance: &mut Instance) -> Result<&mut T, BoxError> {
	(**instance)
		.downcast_mut::<T>()
		.ok_or_else(|| format!("instance is not a {}", std::any::type_name::<T>()).into())
}

// ============================================================================
// Typed declarations
// ============================================================================

/// A constructor of `T`.
pub struct Constructor<T> {
	markers: Vec<AnyMarker>,
	params: Vec<DependencyDescriptor>,
	visibility: Visibility,
	construct: ConstructFn,
	_type: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Constructor<T> {
	/// An unmarked public constructor. Parameters are added with
	/// [`param`](Self::param) and read inside `f` through [`Args`].
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&mut Args) -> Result<T, BoxError> + Send + Sync + 'static,
	{
		Self {
			markers: Vec::new(),
			params: Vec::new(),
			visibility: Visibility::Public,
			construct: Arc::new(move |args| f(args).map(|value| Box::new(value) as Instance)),
			_type: PhantomData,
		}
	}

	/// A constructor marked with [`Inject`].
	pub fn inject<F>(f: F) -> Self
	where
		F: Fn(&mut Args) -> Result<T, BoxError> + Send + Sync + 'static,
	{
		Self::new(f).marked(Inject)
	}

	pub fn marked(mut self, marker: impl Into<AnyMarker>) -> Self {
		self.markers.push(marker.into());
		self
	}

	pub fn param<P: Any>(self) -> Self {
		self.param_marked::<P, _>([])
	}

	/// Adds a parameter carrying a single marker.
	pub fn param_with<P: Any>(self, marker: impl Marker) -> Self {
		self.param_marked::<P, _>([AnyMarker::new(marker)])
	}

	pub fn param_marked<P: Any, I>(mut self, markers: I) -> Self
	where
		I: IntoIterator<Item = AnyMarker>,
	{
		self.params
			.push(DependencyDescriptor::new(TypeKey::of::<P>(), markers));
		self
	}

	pub fn private(mut self) -> Self {
		self.visibility = Visibility::Private;
		self
	}
}

/// A field of `T` (or of one of its ancestors).
pub struct Field<T> {
	name: &'static str,
	ty: TypeKey,
	markers: Vec<AnyMarker>,
	is_static: bool,
	mutable: bool,
	apply: ApplyFn,
	_type: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Field<T> {
	/// An unmarked instance field of type `F`. An absent value leaves the
	/// field untouched.
	pub fn new<F, S>(name: &'static str, setter: S) -> Self
	where
		F: Any + Send + Sync,
		S: Fn(&mut T, Arc<F>) + Send + Sync + 'static,
	{
		Self::with_apply::<F>(
			name,
			false,
			Arc::new(move |instance, args| {
				if let Some(value) = args.take_optional::<F>()? {
					setter(instance_mut::<T>(instance)?, value);
				}
				Ok(())
			}),
		)
	}

	/// An instance field marked with [`Inject`].
	pub fn inject<F, S>(name: &'static str, setter: S) -> Self
	where
		F: Any + Send + Sync,
		S: Fn(&mut T, Arc<F>) + Send + Sync + 'static,
	{
		Self::new(name, setter).marked(Inject)
	}

	/// An injected field whose value is cloned out of the resolved value,
	/// typically for plain values such as numbers or strings.
	pub fn inject_cloned<F, S>(name: &'static str, setter: S) -> Self
	where
		F: Any + Send + Sync + Clone,
		S: Fn(&mut T, F) + Send + Sync + 'static,
	{
		Self::new(name, move |target: &mut T, value: Arc<F>| {
			setter(target, Arc::unwrap_or_clone(value))
		})
		.marked(Inject)
	}

	/// An unmarked static field. `setter` writes process-wide state and does
	/// not see the instance.
	pub fn new_static<F, S>(name: &'static str, setter: S) -> Self
	where
		F: Any + Send + Sync,
		S: Fn(Arc<F>) + Send + Sync + 'static,
	{
		Self::with_apply::<F>(
			name,
			true,
			Arc::new(move |_, args| {
				if let Some(value) = args.take_optional::<F>()? {
					setter(value);
				}
				Ok(())
			}),
		)
	}

	/// A static field marked with [`Inject`].
	pub fn inject_static<F, S>(name: &'static str, setter: S) -> Self
	where
		F: Any + Send + Sync,
		S: Fn(Arc<F>) + Send + Sync + 'static,
	{
		Self::new_static(name, setter).marked(Inject)
	}

	fn with_apply<F: Any>(name: &'static str, is_static: bool, apply: ApplyFn) -> Self {
		Self {
			name,
			ty: TypeKey::of::<F>(),
			markers: Vec::new(),
			is_static,
			mutable: true,
			apply,
			_type: PhantomData,
		}
	}

	pub fn marked(mut self, marker: impl Into<AnyMarker>) -> Self {
		self.markers.push(marker.into());
		self
	}

	/// Declares the field as a binding that cannot be reassigned.
	pub fn immutable(mut self) -> Self {
		self.mutable = false;
		self
	}
}

/// A method of `T` (or of one of its ancestors).
pub struct Method<T> {
	name: &'static str,
	markers: Vec<AnyMarker>,
	params: Vec<DependencyDescriptor>,
	is_static: bool,
	returns: Option<TypeKey>,
	apply: ApplyFn,
	_type: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Method<T> {
	/// An unmarked instance method returning unit. Declared parameters are
	/// read inside `f` through [`Args`].
	pub fn new<F>(name: &'static str, f: F) -> Self
	where
		F: Fn(&mut T, &mut Args) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		Self {
			name,
			markers: Vec::new(),
			params: Vec::new(),
			is_static: false,
			returns: None,
			apply: Arc::new(move |instance, args| f(instance_mut::<T>(instance)?, args)),
			_type: PhantomData,
		}
	}

	/// A method marked with [`Inject`]; its parameters become dependencies.
	pub fn inject<F>(name: &'static str, f: F) -> Self
	where
		F: Fn(&mut T, &mut Args) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		Self::new(name, f).marked(Inject)
	}

	/// A parameterless method marked with [`PostConstruct`].
	pub fn post_construct<F>(name: &'static str, f: F) -> Self
	where
		F: Fn(&mut T) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		Self::new(name, move |target, _| f(target)).marked(PostConstruct)
	}

	pub fn marked(mut self, marker: impl Into<AnyMarker>) -> Self {
		self.markers.push(marker.into());
		self
	}

	pub fn param<P: Any>(mut self) -> Self {
		self.params.push(DependencyDescriptor::of::<P>());
		self
	}

	pub fn param_with<P: Any>(mut self, marker: impl Marker) -> Self {
		self.params.push(DependencyDescriptor::new(
			TypeKey::of::<P>(),
			[AnyMarker::new(marker)],
		));
		self
	}

	pub fn as_static(mut self) -> Self {
		self.is_static = true;
		self
	}

	/// Declares a non-unit return type.
	pub fn returns<R: Any>(mut self) -> Self {
		self.returns = Some(TypeKey::of::<R>());
		self
	}
}

/// The fields and methods declared by one level of a type's ancestry.
pub struct Level<T> {
	key: TypeKey,
	fields: Vec<Field<T>>,
	methods: Vec<Method<T>>,
}

impl<T: Any + Send + Sync> Level<T> {
	fn new(key: TypeKey) -> Self {
		Self {
			key,
			fields: Vec::new(),
			methods: Vec::new(),
		}
	}

	pub fn field(mut self, field: Field<T>) -> Self {
		self.fields.push(field);
		self
	}

	pub fn method(mut self, method: Method<T>) -> Self {
		self.methods.push(method);
		self
	}

	fn erase(self) -> LevelPoints {
		LevelPoints {
			key: self.key,
			fields: self
				.fields
				.into_iter()
				.map(|field| FieldPoint {
					name: field.name,
					dependency: DependencyDescriptor::new(field.ty, field.markers),
					is_static: field.is_static,
					mutable: field.mutable,
					apply: field.apply,
				})
				.collect(),
			methods: self
				.methods
				.into_iter()
				.map(|method| MethodPoint {
					name: method.name,
					markers: method.markers,
					params: method.params,
					is_static: method.is_static,
					returns: method.returns,
					apply: method.apply,
				})
				.collect(),
		}
	}
}

/// Builder for a [`ComponentDescriptor`] of `T`.
pub struct ComponentBuilder<T> {
	scope: Scope,
	markers: Vec<AnyMarker>,
	constructors: Vec<Constructor<T>>,
	levels: Vec<Level<T>>,
}

impl<T: Any + Send + Sync> ComponentBuilder<T> {
	fn new() -> Self {
		Self {
			scope: Scope::Singleton,
			markers: Vec::new(),
			constructors: Vec::new(),
			levels: vec![Level::new(TypeKey::of::<T>())],
		}
	}

	pub fn scope(mut self, scope: Scope) -> Self {
		self.scope = scope;
		self
	}

	pub fn transient(self) -> Self {
		self.scope(Scope::Transient)
	}

	/// Attaches a type-level marker.
	pub fn marked(mut self, marker: impl Into<AnyMarker>) -> Self {
		self.markers.push(marker.into());
		self
	}

	pub fn no_field_scan(self) -> Self {
		self.marked(NoFieldScan)
	}

	pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
		self.constructors.push(constructor);
		self
	}

	/// Adds a field declared by `T` itself.
	pub fn field(mut self, field: Field<T>) -> Self {
		self.levels[0].fields.push(field);
		self
	}

	/// Adds a method declared by `T` itself.
	pub fn method(mut self, method: Method<T>) -> Self {
		self.levels[0].methods.push(method);
		self
	}

	/// Appends the next ancestor level, declared as the type `P`.
	pub fn parent<P: Any>(mut self, declare: impl FnOnce(Level<T>) -> Level<T>) -> Self {
		self.levels.push(declare(Level::new(TypeKey::of::<P>())));
		self
	}

	pub fn build(self) -> ComponentDescriptor {
		ComponentDescriptor {
			key: TypeKey::of::<T>(),
			scope: self.scope,
			markers: self.markers,
			constructors: self
				.constructors
				.into_iter()
				.map(|constructor| ConstructorPoint {
					markers: constructor.markers,
					params: constructor.params,
					visibility: constructor.visibility,
					construct: constructor.construct,
				})
				.collect(),
			levels: self.levels.into_iter().map(Level::erase).collect(),
		}
	}
}

// ============================================================================
// Erased declaration table
// ============================================================================

/// The declaration table of one component type.
#[derive(Clone)]
pub struct ComponentDescriptor {
	key: TypeKey,
	scope: Scope,
	markers: Vec<AnyMarker>,
	constructors: Vec<ConstructorPoint>,
	levels: Vec<LevelPoints>,
}

impl ComponentDescriptor {
	pub fn builder<T: Any + Send + Sync>() -> ComponentBuilder<T> {
		ComponentBuilder::new()
	}

	pub fn key(&self) -> TypeKey {
		self.key
	}

	pub fn scope(&self) -> Scope {
		self.scope
	}

	/// Type-level markers.
	pub fn markers(&self) -> &[AnyMarker] {
		&self.markers
	}

	pub fn has_marker<M: Marker>(&self) -> bool {
		has_marker::<M>(&self.markers)
	}

	pub fn constructors(&self) -> &[ConstructorPoint] {
		&self.constructors
	}

	/// Levels of the ancestry, the type itself first.
	pub fn levels(&self) -> &[LevelPoints] {
		&self.levels
	}

	/// Whether any constructor, field or method at any level carries `M`.
	pub fn is_marked_anywhere<M: Marker>(&self) -> bool {
		self.constructors.iter().any(ConstructorPoint::is_marked::<M>)
			|| self.levels.iter().any(|level| {
				level.fields.iter().any(FieldPoint::is_marked::<M>)
					|| level.methods.iter().any(MethodPoint::is_marked::<M>)
			})
	}
}

impl fmt::Debug for ComponentDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentDescriptor")
			.field("key", &self.key.name())
			.field("scope", &self.scope)
			.field("markers", &self.markers)
			.field("constructors", &self.constructors)
			.field("levels", &self.levels)
			.finish()
	}
}

#[derive(Clone)]
pub struct ConstructorPoint {
	markers: Vec<AnyMarker>,
	params: Vec<DependencyDescriptor>,
	visibility: Visibility,
	construct: ConstructFn,
}

impl ConstructorPoint {
	pub fn markers(&self) -> &[AnyMarker] {
		&self.markers
	}

	pub fn is_marked<M: Marker>(&self) -> bool {
		has_marker::<M>(&self.markers)
	}

	pub fn params(&self) -> &[DependencyDescriptor] {
		&self.params
	}

	pub fn visibility(&self) -> Visibility {
		self.visibility
	}

	pub fn is_public(&self) -> bool {
		self.visibility == Visibility::Public
	}

	pub(crate) fn construct_fn(&self) -> ConstructFn {
		Arc::clone(&self.construct)
	}
}

impl fmt::Debug for ConstructorPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConstructorPoint")
			.field("markers", &self.markers)
			.field("params", &self.params)
			.field("visibility", &self.visibility)
			.finish_non_exhaustive()
	}
}

#[derive(Clone)]
pub struct LevelPoints {
	key: TypeKey,
	fields: Vec<FieldPoint>,
	methods: Vec<MethodPoint>,
}

impl LevelPoints {
	/// The type that declares this level.
	pub fn key(&self) -> TypeKey {
		self.key
	}

	pub fn fields(&self) -> &[FieldPoint] {
		&self.fields
	}

	pub fn methods(&self) -> &[MethodPoint] {
		&self.methods
	}
}

impl fmt::Debug for LevelPoints {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LevelPoints")
			.field("key", &self.key.name())
			.field("fields", &self.fields)
			.field("methods", &self.methods)
			.finish()
	}
}

#[derive(Clone)]
pub struct FieldPoint {
	name: &'static str,
	dependency: DependencyDescriptor,
	is_static: bool,
	mutable: bool,
	apply: ApplyFn,
}

impl FieldPoint {
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// The field's type and markers as a dependency.
	pub fn dependency(&self) -> &DependencyDescriptor {
		&self.dependency
	}

	pub fn is_marked<M: Marker>(&self) -> bool {
		self.dependency.has_marker::<M>()
	}

	pub fn is_static(&self) -> bool {
		self.is_static
	}

	pub fn is_mutable(&self) -> bool {
		self.mutable
	}

	pub(crate) fn apply_fn(&self) -> ApplyFn {
		Arc::clone(&self.apply)
	}
}

impl fmt::Debug for FieldPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldPoint")
			.field("name", &self.name)
			.field("dependency", &self.dependency)
			.field("is_static", &self.is_static)
			.field("mutable", &self.mutable)
			.finish_non_exhaustive()
	}
}

#[derive(Clone)]
pub struct MethodPoint {
	name: &'static str,
	markers: Vec<AnyMarker>,
	params: Vec<DependencyDescriptor>,
	is_static: bool,
	returns: Option<TypeKey>,
	apply: ApplyFn,
}

impl MethodPoint {
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn markers(&self) -> &[AnyMarker] {
		&self.markers
	}

	pub fn is_marked<M: Marker>(&self) -> bool {
		has_marker::<M>(&self.markers)
	}

	pub fn params(&self) -> &[DependencyDescriptor] {
		&self.params
	}

	pub fn is_static(&self) -> bool {
		self.is_static
	}

	/// Declared return type; `None` for unit.
	pub fn returns(&self) -> Option<TypeKey> {
		self.returns
	}

	pub(crate) fn apply_fn(&self) -> ApplyFn {
		Arc::clone(&self.apply)
	}
}

impl fmt::Debug for MethodPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MethodPoint")
			.field("name", &self.name)
			.field("markers", &self.markers)
			.field("params", &self.params)
			.field("is_static", &self.is_static)
			.field("returns", &self.returns.map(|key| key.name()))
			.finish_non_exhaustive()
	}
}
