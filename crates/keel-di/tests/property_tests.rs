//! Property-based tests for dependency ordering
//!
//! Uses proptest to verify:
//! 1. Constructor parameters resolve in declaration order
//! 2. Field dependencies run from the most distant ancestor to the type itself
//! 3. Resolving the same graph twice yields the same plan

use keel_di::{
	ComponentDescriptor, Constructor, DiResult, Field, Injector, Level, Marker, MarkerHandler,
	Resolution, ResolutionContext, TypeKey,
};
use proptest::prelude::*;

/// Identifies a dependency by its declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot(usize);
impl Marker for Slot {}

struct SlotHandler;

impl MarkerHandler for SlotHandler {
	type Marker = Slot;

	fn resolve_marked(&self, _: &ResolutionContext<'_>, marker: &Slot) -> DiResult<Option<Resolution>> {
		Ok(Some(Resolution::of(marker.0)))
	}
}

const NAMES: [&str; 8] = ["f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7"];

#[derive(Debug, Default)]
struct Collected {
	seen: Vec<usize>,
}

struct Grandparent;
struct Parent;

fn slot_fields(level: Level<Collected>, range: std::ops::Range<usize>) -> Level<Collected> {
	range.fold(level, |level, i| level.field(slot_field(i)))
}

fn slot_field(i: usize) -> Field<Collected> {
	Field::inject_cloned(NAMES[i % NAMES.len()], |c: &mut Collected, v: usize| c.seen.push(v))
		.marked(Slot(i))
}

fn layered(own: usize, parent: usize, grandparent: usize) -> ComponentDescriptor {
	// Slots are numbered in the order they must be injected.
	let grandparent_range = 0..grandparent;
	let parent_range = grandparent..grandparent + parent;
	let own_range = grandparent + parent..grandparent + parent + own;

	let builder = ComponentDescriptor::builder::<Collected>()
		.constructor(Constructor::new(|_| Ok(Collected::default())));
	own_range
		.fold(builder, |builder, i| builder.field(slot_field(i)))
		.parent::<Parent>(|level| slot_fields(level, parent_range))
		.parent::<Grandparent>(|level| slot_fields(level, grandparent_range))
		.build()
}

fn positional(count: usize) -> ComponentDescriptor {
	let constructor = Constructor::inject(move |args| {
		let mut seen = Vec::with_capacity(count);
		while args.remaining() > 0 {
			seen.push(args.take_cloned::<usize>()?);
		}
		Ok(Collected { seen })
	});
	let constructor = (0..count).fold(constructor, |c, i| c.param_with::<usize>(Slot(i)));
	ComponentDescriptor::builder::<Collected>()
		.constructor(constructor)
		.build()
}

#[test]
fn prop_constructor_parameters_keep_declaration_order() {
	proptest!(|(count in 0usize..12)| {
		let injector = Injector::builder()
			.handler(SlotHandler)
			.register(positional(count))
			.build()
			.unwrap();

		let collected = injector.new_instance::<Collected>().unwrap();

		prop_assert_eq!(collected.seen, (0..count).collect::<Vec<_>>());
	});
}

#[test]
fn prop_fields_inject_from_most_distant_ancestor() {
	proptest!(|(own in 0usize..4, parent in 0usize..4, grandparent in 0usize..4)| {
		prop_assume!(own + parent + grandparent > 0);
		let injector = Injector::builder()
			.handler(SlotHandler)
			.register(layered(own, parent, grandparent))
			.build()
			.unwrap();

		let collected = injector.new_instance::<Collected>().unwrap();

		prop_assert_eq!(collected.seen, (0..own + parent + grandparent).collect::<Vec<_>>());
	});
}

#[test]
fn prop_plans_are_deterministic() {
	proptest!(|(own in 1usize..4, parent in 0usize..4, attempts in 2usize..5)| {
		let injector = Injector::builder()
			.handler(SlotHandler)
			.register(layered(own, parent, 0))
			.build()
			.unwrap();

		let first: Vec<Option<Slot>> = injector
			.instantiation_plan(TypeKey::of::<Collected>())
			.unwrap()
			.dependencies()
			.iter()
			.map(|d| d.marker::<Slot>().copied())
			.collect();

		for _ in 0..attempts {
			let plan = injector.instantiation_plan(TypeKey::of::<Collected>()).unwrap();
			let again: Vec<Option<Slot>> = plan
				.dependencies()
				.iter()
				.map(|d| d.marker::<Slot>().copied())
				.collect();
			prop_assert_eq!(&again, &first);
		}
		prop_assert_eq!(first.len(), own + parent);
	});
}
