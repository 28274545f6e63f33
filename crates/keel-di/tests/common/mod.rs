//! Sample components shared by the integration tests

#![allow(dead_code)]

use keel_di::{ComponentDescriptor, Constructor, Field, Marker, Method};
use std::sync::{Arc, Mutex};

/// Qualifies a size value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Size(pub &'static str);
impl Marker for Size {}

/// Qualifies a duration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration;
impl Marker for Duration {}

/// A value supplied from outside the container.
#[derive(Debug, PartialEq, Eq)]
pub struct ProvidedClass(pub String);

// ============================================================================
// Constructor injection
// ============================================================================

#[derive(Debug)]
pub struct Beta {
	pub provided: Arc<ProvidedClass>,
	pub size: i32,
	pub duration: i64,
}

pub fn beta() -> ComponentDescriptor {
	ComponentDescriptor::builder::<Beta>()
		.constructor(
			Constructor::inject(|args| {
				Ok(Beta {
					provided: args.take()?,
					size: args.take_cloned()?,
					duration: args.take_cloned()?,
				})
			})
			.param::<ProvidedClass>()
			.param_with::<i32>(Size("box"))
			.param_with::<i64>(Duration),
		)
		.build()
}

#[derive(Debug)]
pub struct AlphaService {
	pub provided: Arc<ProvidedClass>,
}

pub fn alpha_service() -> ComponentDescriptor {
	ComponentDescriptor::builder::<AlphaService>()
		.constructor(
			Constructor::inject(|args| {
				Ok(AlphaService {
					provided: args.take()?,
				})
			})
			.param::<ProvidedClass>(),
		)
		.build()
}

#[derive(Debug)]
pub struct GammaService {
	pub alpha: Arc<AlphaService>,
}

pub fn gamma_service() -> ComponentDescriptor {
	ComponentDescriptor::builder::<GammaService>()
		.constructor(
			Constructor::inject(|args| Ok(GammaService { alpha: args.take()? }))
				.param::<AlphaService>(),
		)
		.build()
}

// ============================================================================
// Field injection across an inheritance chain
// ============================================================================

/// Ancestor level of [`Turtle`].
pub struct Reptile;

#[derive(Debug, Default)]
pub struct Turtle {
	pub gamma: Option<Arc<GammaService>>,
	pub size: i32,
	pub alpha: Option<Arc<AlphaService>>,
	pub duration: i64,
}

pub fn turtle() -> ComponentDescriptor {
	ComponentDescriptor::builder::<Turtle>()
		.constructor(Constructor::new(|_| Ok(Turtle::default())))
		.field(Field::inject("alpha", |t: &mut Turtle, a: Arc<AlphaService>| {
			t.alpha = Some(a)
		}))
		.field(
			Field::inject_cloned("duration", |t: &mut Turtle, d: i64| t.duration = d)
				.marked(Duration),
		)
		.parent::<Reptile>(|level| {
			level
				.field(Field::inject("gamma", |t: &mut Turtle, g: Arc<GammaService>| {
					t.gamma = Some(g)
				}))
				.field(
					Field::inject_cloned("size", |t: &mut Turtle, s: i32| t.size = s)
						.marked(Size("chest")),
				)
		})
		.build()
}

// ============================================================================
// Post-construct hooks on three levels
// ============================================================================

pub struct Base;
pub struct Middle;

#[derive(Debug, Default)]
pub struct Leaf {
	pub events: Vec<&'static str>,
}

/// Records every hook invocation across instances.
pub static HOOK_LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

fn record(leaf: &mut Leaf, event: &'static str) {
	leaf.events.push(event);
	HOOK_LOG
		.lock()
		.unwrap_or_else(std::sync::PoisonError::into_inner)
		.push(event);
}

pub fn leaf() -> keel_di::ComponentBuilder<Leaf> {
	ComponentDescriptor::builder::<Leaf>()
		.constructor(Constructor::new(|_| Ok(Leaf::default())))
		.method(Method::post_construct("leaf_init", |l: &mut Leaf| {
			record(l, "leaf");
			Ok(())
		}))
		.parent::<Middle>(|level| {
			level.method(Method::post_construct("middle_init", |l: &mut Leaf| {
				record(l, "middle");
				Ok(())
			}))
		})
		.parent::<Base>(|level| {
			level.method(Method::post_construct("base_init", |l: &mut Leaf| {
				record(l, "base");
				Ok(())
			}))
		})
}

// ============================================================================
// Cycles
// ============================================================================

#[derive(Debug)]
pub struct CycleA {
	pub b: Arc<CycleB>,
}

#[derive(Debug)]
pub struct CycleB {
	pub a: Arc<CycleA>,
}

pub fn cycle_a() -> ComponentDescriptor {
	ComponentDescriptor::builder::<CycleA>()
		.constructor(Constructor::inject(|args| Ok(CycleA { b: args.take()? })).param::<CycleB>())
		.build()
}

pub fn cycle_b() -> ComponentDescriptor {
	ComponentDescriptor::builder::<CycleB>()
		.constructor(Constructor::inject(|args| Ok(CycleB { a: args.take()? })).param::<CycleA>())
		.build()
}
