//! Post-construct hooks driven by the injector

mod common;

use common::*;
use keel_di::{
	ComponentDescriptor, Constructor, DiError, ErrorKind, Field, Injector, Method,
	PostConstructInvoker, TypeKey,
};
use rstest::rstest;
use serial_test::serial;
use std::sync::{Arc, PoisonError};

fn take_log() -> Vec<&'static str> {
	std::mem::take(&mut *HOOK_LOG.lock().unwrap_or_else(PoisonError::into_inner))
}

#[rstest]
#[serial(hook_log)]
fn test_hooks_run_from_most_distant_ancestor() {
	// Arrange
	take_log();
	let injector = Injector::builder().register(leaf().build()).build().unwrap();

	// Act
	let leaf = injector.get_singleton::<Leaf>().unwrap();

	// Assert
	assert_eq!(leaf.events, vec!["base", "middle", "leaf"]);
	assert_eq!(take_log(), vec!["base", "middle", "leaf"]);
}

#[rstest]
#[serial(hook_log)]
fn test_singleton_hooks_run_once() {
	// Arrange
	take_log();
	let injector = Injector::builder().register(leaf().build()).build().unwrap();

	// Act
	let first = injector.get_singleton::<Leaf>().unwrap();
	let second = injector.get_singleton::<Leaf>().unwrap();

	// Assert
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(take_log().len(), 3);
}

#[rstest]
#[serial(hook_log)]
fn test_transient_hooks_run_per_instance() {
	// Arrange
	take_log();
	let injector = Injector::builder()
		.register(leaf().transient().build())
		.build()
		.unwrap();

	// Act
	injector.resolve::<Leaf>().unwrap();
	injector.new_instance::<Leaf>().unwrap();

	// Assert
	assert_eq!(take_log().len(), 6);
}

#[rstest]
fn test_hook_table_lists_ancestors_first() {
	// Arrange
	let component = leaf().build();

	// Act
	let hooks = PostConstructInvoker::new().hooks_for(&component).unwrap();

	// Assert
	let owners: Vec<TypeKey> = hooks.iter().map(|h| h.declaring_type()).collect();
	assert_eq!(
		owners,
		vec![TypeKey::of::<Base>(), TypeKey::of::<Middle>(), TypeKey::of::<Leaf>()]
	);
	let names: Vec<&str> = hooks.iter().map(|h| h.name()).collect();
	assert_eq!(names, vec!["base_init", "middle_init", "leaf_init"]);
}

#[rstest]
fn test_hooks_see_injected_fields() {
	// Arrange
	#[derive(Default)]
	struct Greeter {
		provided: Option<Arc<ProvidedClass>>,
		greeting: String,
	}
	let injector = Injector::builder()
		.provide(ProvidedClass("world".into()))
		.register(
			ComponentDescriptor::builder::<Greeter>()
				.constructor(Constructor::new(|_| Ok(Greeter::default())))
				.field(Field::inject("provided", |g: &mut Greeter, p: Arc<ProvidedClass>| {
					g.provided = Some(p)
				}))
				.method(Method::post_construct("greet", |g: &mut Greeter| {
					let name = g.provided.as_ref().ok_or("provided value missing")?;
					g.greeting = format!("hello {}", name.0);
					Ok(())
				}))
				.build(),
		)
		.build()
		.unwrap();

	// Act
	let greeter = injector.get_singleton::<Greeter>().unwrap();

	// Assert
	assert_eq!(greeter.greeting, "hello world");
}

#[rstest]
fn test_two_hooks_on_one_level_fail_at_registration() {
	// Arrange
	let component = leaf()
		.method(Method::post_construct("second_init", |_: &mut Leaf| Ok(())))
		.build();

	// Act
	let result = Injector::builder().register(component).build();

	// Assert
	match result {
		Err(error @ DiError::Validation { .. }) => {
			assert_eq!(error.kind(), ErrorKind::Validation);
			assert!(error.to_string().contains("Multiple methods with @PostConstruct"));
			assert_eq!(error.type_name(), Some(std::any::type_name::<Leaf>()));
		}
		Err(other) => panic!("Expected a validation error, got {other:?}"),
		Ok(_) => panic!("Expected a validation error"),
	}
}

#[rstest]
fn test_failing_hook_prevents_caching() {
	// Arrange
	struct Flaky;
	let injector = Injector::builder()
		.register(
			ComponentDescriptor::builder::<Flaky>()
				.constructor(Constructor::new(|_| Ok(Flaky)))
				.method(Method::post_construct("connect", |_: &mut Flaky| {
					Err("backend unavailable".into())
				}))
				.build(),
		)
		.build()
		.unwrap();

	// Act
	let result = injector.get_singleton::<Flaky>();

	// Assert
	assert!(matches!(result, Err(DiError::Instantiation { .. })));
	assert!(!injector.singleton_scope().contains(TypeKey::of::<Flaky>()));
}
