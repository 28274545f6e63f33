//! Error types for dependency resolution

use crate::cycle_detection::CycleError;
use crate::key::TypeKey;

/// Error type returned by user-supplied construction closures and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type DiResult<T> = Result<T, DiError>;

/// Broad category of a [`DiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Static shape violation of a declared component.
	Validation,
	/// A dependency could not be satisfied, or was absent where not permitted.
	Resolution,
	/// Re-entrant construction of a type already being built.
	Cycle,
	/// The construction step itself failed.
	Instantiation,
}

#[derive(Debug, thiserror::Error)]
pub enum DiError {
	#[error("{message} (in {type_name})")]
	Validation {
		type_name: &'static str,
		message: String,
	},

	#[error("A value for {key} has already been registered")]
	DuplicateRegistration { key: &'static str },

	#[error("No value could be resolved for dependency #{position} ({dependency}) of {type_name}")]
	Unresolvable {
		type_name: &'static str,
		position: usize,
		dependency: &'static str,
	},

	#[error("No instantiation method available for {type_name}")]
	NoInstantiation { type_name: &'static str },

	#[error("Dependency #{position} of {type_name} has no value")]
	NullDependency {
		type_name: &'static str,
		position: usize,
	},

	#[error("{type_name} expects {expected} dependencies but {actual} values were supplied")]
	ArgumentCount {
		type_name: &'static str,
		expected: usize,
		actual: usize,
	},

	#[error("Dependency #{position} of {type_name} is not of type {expected}")]
	ArgumentMismatch {
		type_name: &'static str,
		position: usize,
		expected: &'static str,
	},

	#[error(transparent)]
	Cycle(#[from] CycleError),

	#[error("Invalid settings document: {0}")]
	Settings(#[from] toml::de::Error),

	#[error("Error during instantiation of {type_name}: {source}")]
	Instantiation {
		type_name: &'static str,
		#[source]
		source: BoxError,
	},
}

impl DiError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			DiError::Validation { .. }
			| DiError::DuplicateRegistration { .. }
			| DiError::Settings(_) => ErrorKind::Validation,
			DiError::Unresolvable { .. }
			| DiError::NoInstantiation { .. }
			| DiError::NullDependency { .. }
			| DiError::ArgumentCount { .. }
			| DiError::ArgumentMismatch { .. } => ErrorKind::Resolution,
			DiError::Cycle(_) => ErrorKind::Cycle,
			DiError::Instantiation { .. } => ErrorKind::Instantiation,
		}
	}

	/// Name of the type the error is about, when there is one.
	pub fn type_name(&self) -> Option<&'static str> {
		match self {
			DiError::Validation { type_name, .. }
			| DiError::Unresolvable { type_name, .. }
			| DiError::NoInstantiation { type_name }
			| DiError::NullDependency { type_name, .. }
			| DiError::ArgumentCount { type_name, .. }
			| DiError::ArgumentMismatch { type_name, .. }
			| DiError::Instantiation { type_name, .. } => Some(*type_name),
			DiError::DuplicateRegistration { .. } | DiError::Cycle(_) | DiError::Settings(_) => {
				None
			}
		}
	}

	pub(crate) fn validation(owner: TypeKey, message: impl Into<String>) -> Self {
		DiError::Validation {
			type_name: owner.name(),
			message: message.into(),
		}
	}

	/// Converts an error raised by user code while building `owner`.
	///
	/// Errors that already are a [`DiError`] keep their identity; anything else
	/// becomes [`DiError::Instantiation`] with the original error as its source.
	pub(crate) fn rethrow(owner: TypeKey, error: BoxError) -> Self {
		match error.downcast::<DiError>() {
			Ok(di_error) => *di_error,
			Err(source) => DiError::Instantiation {
				type_name: owner.name(),
				source,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::error::Error as _;

	struct Widget;

	#[rstest]
	fn test_rethrow_keeps_di_errors() {
		// Arrange
		let original: BoxError = Box::new(DiError::NullDependency {
			type_name: "Other",
			position: 2,
		});

		// Act
		let error = DiError::rethrow(TypeKey::of::<Widget>(), original);

		// Assert
		assert!(matches!(
			error,
			DiError::NullDependency {
				type_name: "Other",
				position: 2
			}
		));
	}

	#[rstest]
	fn test_rethrow_wraps_foreign_errors_and_keeps_cause() {
		// Arrange
		let original: BoxError = "socket closed".into();

		// Act
		let error = DiError::rethrow(TypeKey::of::<Widget>(), original);

		// Assert
		assert_eq!(error.kind(), ErrorKind::Instantiation);
		assert_eq!(error.source().map(ToString::to_string).as_deref(), Some("socket closed"));
		assert!(error.to_string().contains("Widget"));
	}

	#[rstest]
	#[case(DiError::DuplicateRegistration { key: "Size" }, ErrorKind::Validation)]
	#[case(DiError::NoInstantiation { type_name: "A" }, ErrorKind::Resolution)]
	#[case(DiError::Cycle(CycleError::NoScope), ErrorKind::Cycle)]
	fn test_kind_mapping(#[case] error: DiError, #[case] expected: ErrorKind) {
		assert_eq!(error.kind(), expected);
	}
}
