//! Dependency injection core.
//!
//! # Examples
//!
//! ```
//! use keel::di::{InjectorSettings, StandardStrategy};
//!
//! let settings = InjectorSettings::default();
//! let strategy = StandardStrategy::new().with_static_fields(settings.static_field_policy());
//! # let _ = strategy;
//! ```

pub use keel_di::*;
