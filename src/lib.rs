//! # Keel
//!
//! A dependency injection container in which components declare their
//! injection points explicitly: constructors, fields and methods carry
//! markers, and pluggable handlers resolve marked dependencies.
//!
//! ## Feature Flags
//!
//! - `extras` - catalog-backed resolvers such as `AllTypes`
//! - `full` - all of the above
//!
//! ## Quick Example
//!
//! ```
//! use keel::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Config;
//!
//! #[derive(Default)]
//! struct Server {
//!     config: Option<Arc<Config>>,
//!     started: bool,
//! }
//!
//! let injector = Injector::builder()
//!     .register(
//!         ComponentDescriptor::builder::<Config>()
//!             .constructor(Constructor::new(|_| Ok(Config)))
//!             .build(),
//!     )
//!     .register(
//!         ComponentDescriptor::builder::<Server>()
//!             .constructor(Constructor::new(|_| Ok(Server::default())))
//!             .field(Field::inject("config", |s: &mut Server, c: Arc<Config>| s.config = Some(c)))
//!             .method(Method::post_construct("start", |s: &mut Server| {
//!                 s.started = true;
//!                 Ok(())
//!             }))
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let server = injector.get_singleton::<Server>().unwrap();
//! assert!(server.started && server.config.is_some());
//! ```

pub mod di;
#[cfg(feature = "extras")]
pub mod extras;

pub use keel_di::{
	ComponentDescriptor, DiError, DiResult, Injector, InjectorBuilder, InjectorSettings, TypeKey,
};

/// The types needed to declare and resolve components.
pub mod prelude {
	pub use keel_di::{
		Args, ComponentDescriptor, Constructor, DiError, DiResult, Field, Handler, Inject, Injector,
		InjectorSettings, Marker, MarkerHandler, Method, NoFieldScan, PostConstruct, Resolution,
		ResolutionContext, Scope, Setting, SettingsHandler, TypeKey,
	};
}
