//! Positional access to resolved dependency values

use crate::dependency::Resolution;
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use std::any::Any;
use std::sync::Arc;

/// Resolved values handed to a component's construction closures, in the
/// order of the instantiation plan's dependencies.
///
/// Each `take*` call consumes the next value. Constructors take all of their
/// parameters, fields take one value each, injected methods take one value
/// per parameter.
pub struct Args {
	owner: TypeKey,
	values: std::vec::IntoIter<Resolution>,
	position: usize,
	total: usize,
}

impl Args {
	pub(crate) fn new(owner: TypeKey, values: Vec<Resolution>) -> Self {
		let total = values.len();
		Self {
			owner,
			values: values.into_iter(),
			position: 0,
			total,
		}
	}

	/// Position of the next value in the plan's dependency list.
	pub fn position(&self) -> usize {
		self.position
	}

	pub fn remaining(&self) -> usize {
		self.total - self.position
	}

	/// Takes the next value, which must be present and of type `T`.
	pub fn take<T: Any + Send + Sync>(&mut self) -> DiResult<Arc<T>> {
		let position = self.position;
		match self.take_optional::<T>()? {
			Some(value) => Ok(value),
			None => Err(DiError::NullDependency {
				type_name: self.owner.name(),
				position,
			}),
		}
	}

	/// Takes the next value and clones it out of its shared pointer.
	pub fn take_cloned<T: Any + Send + Sync + Clone>(&mut self) -> DiResult<T> {
		self.take::<T>().map(Arc::unwrap_or_clone)
	}

	/// Takes the next value, returning `None` if a resolver declared it absent.
	pub fn take_optional<T: Any + Send + Sync>(&mut self) -> DiResult<Option<Arc<T>>> {
		let position = self.position;
		let resolution = self.values.next().ok_or(DiError::ArgumentCount {
			type_name: self.owner.name(),
			expected: position + 1,
			actual: self.total,
		})?;
		self.position += 1;

		match resolution {
			Resolution::Value(value) => {
				value
					.downcast::<T>()
					.map(Some)
					.map_err(|_| DiError::ArgumentMismatch {
						type_name: self.owner.name(),
						position,
						expected: std::any::type_name::<T>(),
					})
			}
			Resolution::Absent => Ok(None),
		}
	}

	/// Fails if values were supplied that no closure consumed.
	pub(crate) fn finish(self) -> DiResult<()> {
		if self.position == self.total {
			Ok(())
		} else {
			Err(DiError::ArgumentCount {
				type_name: self.owner.name(),
				expected: self.position,
				actual: self.total,
			})
		}
	}
}
