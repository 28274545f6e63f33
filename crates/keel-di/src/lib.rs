//! # Keel Dependency Injection
//!
//! Constructor, field and method injection driven by explicit component
//! declarations.
//!
//! ## Features
//!
//! - **Declared, not discovered**: each type lists its constructors, fields
//!   and methods together with their markers once, at registration time
//! - **Strategies**: `@Inject` constructor, `@Inject` fields and methods on a
//!   no-argument constructor, or a marker-free fallback
//! - **Pluggable resolvers**: handlers supply values for marked dependencies
//!   and post-process new instances
//! - **Post-construct hooks**: run ancestor first, validated up front
//! - **Singletons**: constructed at most once, also under concurrent access
//! - **Cycle detection**: re-entrant construction fails instead of recursing
//!
//! ## Example
//!
//! ```
//! use keel_di::{ComponentDescriptor, Constructor, Injector, Setting, SettingsHandler};
//!
//! struct Pool {
//!     size: i64,
//! }
//!
//! let injector = Injector::builder()
//!     .handler(SettingsHandler::new().with("pool.size", 8i64))
//!     .register(
//!         ComponentDescriptor::builder::<Pool>()
//!             .constructor(
//!                 Constructor::inject(|args| Ok(Pool { size: args.take_cloned()? }))
//!                     .param_with::<i64>(Setting("pool.size")),
//!             )
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(injector.get_singleton::<Pool>().unwrap().size, 8);
//! ```

mod args;
pub mod component;
pub mod cycle_detection;
pub mod dependency;
pub mod error;
pub mod handler;
pub mod injector;
pub mod instantiation;
pub mod key;
pub mod marker;
pub mod scope;
pub mod settings;

pub use args::Args;
pub use component::{
	ComponentBuilder, ComponentDescriptor, Constructor, ConstructorPoint, Field, FieldPoint, Instance,
	Level, LevelPoints, Method, MethodPoint, Visibility,
};
pub use cycle_detection::{CycleError, DEFAULT_MAX_RESOLUTION_DEPTH};
pub use dependency::{DependencyDescriptor, Resolution, ResolutionContext, Value};
pub use error::{BoxError, DiError, DiResult, ErrorKind};
pub use handler::{
	ConstructionContext, Handler, HandlerPipeline, MarkerHandler, PostConstructHook,
	PostConstructInvoker, SavedMarkersHandler, Setting, SettingsHandler,
};
pub use injector::{Injector, InjectorBuilder};
pub use instantiation::{
	FallbackStrategy, InstantiationPlan, InstantiationStrategy, StandardStrategy, StaticFieldPolicy,
};
pub use key::TypeKey;
pub use marker::{AnyMarker, Inject, Marker, NoFieldScan, PostConstruct};
pub use scope::{Scope, SingletonScope};
pub use settings::InjectorSettings;
