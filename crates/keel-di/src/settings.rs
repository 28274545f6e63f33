//! Injector configuration

use crate::cycle_detection::DEFAULT_MAX_RESOLUTION_DEPTH;
use crate::error::DiResult;
use crate::instantiation::StaticFieldPolicy;
use serde::Deserialize;

/// Settings of an [`Injector`](crate::Injector).
///
/// # Examples
///
/// ```
/// use keel_di::InjectorSettings;
///
/// let settings = InjectorSettings::from_toml_str("allow_static_fields = true").unwrap();
/// assert!(settings.allow_static_fields);
/// assert_eq!(settings.max_resolution_depth, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InjectorSettings {
	/// Longest chain of nested resolutions before giving up.
	pub max_resolution_depth: usize,
	/// Accept `@Inject` on static fields.
	pub allow_static_fields: bool,
	/// Register the fallback strategy after the standard one.
	pub fallback_instantiation: bool,
}

impl Default for InjectorSettings {
	fn default() -> Self {
		Self {
			max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
			allow_static_fields: false,
			fallback_instantiation: true,
		}
	}
}

impl InjectorSettings {
	pub fn from_toml_str(document: &str) -> DiResult<Self> {
		Ok(toml::from_str(document)?)
	}

	pub fn static_field_policy(&self) -> StaticFieldPolicy {
		if self.allow_static_fields {
			StaticFieldPolicy::Allow
		} else {
			StaticFieldPolicy::Reject
		}
	}
}
