//! Circular dependency detection
//!
//! Resolution is a synchronous depth-first walk, so the set of types currently
//! under construction lives on the thread that runs the walk. Singletons are
//! shared between threads, though: a thread may block on a singleton another
//! thread is building. [`ConstructionGraph`] records who builds and who waits
//! so that a cycle spread over several threads is reported instead of
//! blocking forever.
//!
//! ## Features
//!
//! - **O(1) Circular Detection**: Fast lookup using `HashSet<TypeId>`
//! - **Depth Limiting**: a configurable maximum depth stops pathological chains
//! - **Deterministic**: Always checks for cycles at every depth
//! - **RAII**: Automatic cleanup via `ResolutionGuard`

use crate::key::TypeKey;
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};
use tracing::debug;

/// Default maximum resolution depth
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

/// Per-thread state for cycle detection
struct CycleDetectionState {
	/// Set of types currently being resolved (O(1) circular detection)
	resolution_set: HashSet<TypeId>,
	/// Resolution path (for displaying circular paths)
	resolution_path: Vec<TypeKey>,
	max_depth: usize,
}

impl CycleDetectionState {
	fn new(max_depth: usize) -> Self {
		Self {
			resolution_set: HashSet::new(),
			resolution_path: Vec::new(),
			max_depth,
		}
	}
}

thread_local! {
	static CYCLE_STATE: RefCell<Option<CycleDetectionState>> = const { RefCell::new(None) };
}

/// Clears the state of the outermost scope, also when unwinding.
struct ScopeReset;

impl Drop for ScopeReset {
	fn drop(&mut self) {
		CYCLE_STATE.with(|state| state.borrow_mut().take());
	}
}

/// Execute `f` within a cycle detection scope.
///
/// This must wrap the outermost resolution entry point. If a scope is already
/// active (nested resolution), `f` runs directly within the existing scope and
/// `max_depth` is ignored.
pub fn with_cycle_detection_scope<F, T>(max_depth: usize, f: F) -> T
where
	F: FnOnce() -> T,
{
	let already_scoped = CYCLE_STATE.with(|state| state.borrow().is_some());
	if already_scoped {
		return f();
	}

	CYCLE_STATE.with(|state| {
		*state.borrow_mut() = Some(CycleDetectionState::new(max_depth));
	});
	let _reset = ScopeReset;
	f()
}

/// Access the thread-local state, returning an error if no scope is active.
fn with_state<R>(f: impl FnOnce(&mut CycleDetectionState) -> R) -> Result<R, CycleError> {
	CYCLE_STATE.with(|state| {
		let mut state = state.borrow_mut();
		state.as_mut().map(f).ok_or(CycleError::NoScope)
	})
}

/// Record the start of resolution of `key`.
///
/// Fails if `key` is already being resolved further up the current call
/// stack, or if the maximum depth would be exceeded. The returned guard
/// removes `key` from the stack when dropped.
pub fn begin_resolution(key: TypeKey) -> Result<ResolutionGuard, CycleError> {
	with_state(|state| {
		let depth = state.resolution_path.len() + 1;
		if depth > state.max_depth {
			return Err(CycleError::MaxDepthExceeded(depth));
		}

		if state.resolution_set.contains(&key.id()) {
			return Err(CycleError::CircularDependency {
				type_name: key.name().to_string(),
				path: build_cycle_path(state, key),
			});
		}

		state.resolution_set.insert(key.id());
		state.resolution_path.push(key);
		Ok(ResolutionGuard { key })
	})?
}

/// Returns the current resolution depth, or `None` outside of a scope.
pub fn current_depth() -> Option<usize> {
	with_state(|state| state.resolution_path.len()).ok()
}

/// RAII guard: the type is removed from the stack when resolution completes.
#[derive(Debug)]
pub struct ResolutionGuard {
	key: TypeKey,
}

impl Drop for ResolutionGuard {
	fn drop(&mut self) {
		let key = self.key;
		let _ = with_state(|state| {
			state.resolution_set.remove(&key.id());
			if let Some(pos) = state.resolution_path.iter().rposition(|k| *k == key) {
				state.resolution_path.remove(pos);
			}
		});
	}
}

fn build_cycle_path(state: &CycleDetectionState, current: TypeKey) -> String {
	match state.resolution_path.iter().position(|k| *k == current) {
		Some(cycle_start) => {
			let cycle: Vec<&str> = state.resolution_path[cycle_start..]
				.iter()
				.map(TypeKey::short_name)
				.collect();
			format!("{} -> {}", cycle.join(" -> "), current.short_name())
		}
		None => format!("Unknown cycle involving {}", current.short_name()),
	}
}

/// Builders and waiters of shared singletons across threads.
///
/// A thread claims a singleton while it builds it, and announces the
/// singleton it is about to wait for. If following "waits for, built by"
/// edges from that singleton leads back to the announcing thread, waiting
/// would never end and [`CycleError::CircularDependency`] is returned
/// instead.
#[derive(Debug, Default)]
pub struct ConstructionGraph {
	state: Mutex<GraphState>,
}

#[derive(Debug, Default)]
struct GraphState {
	builders: HashMap<TypeId, ThreadId>,
	waiting: HashMap<ThreadId, TypeKey>,
}

impl ConstructionGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records the current thread as the builder of `key` until the guard is
	/// dropped. A building thread is no longer waiting.
	pub fn claim(&self, key: TypeKey) -> ClaimGuard<'_> {
		let me = thread::current().id();
		let mut state = self.state();
		state.waiting.remove(&me);
		state.builders.insert(key.id(), me);
		ClaimGuard { graph: self, key }
	}

	/// Announces that the current thread is about to wait for `key`.
	///
	/// Fails if the builder of `key`, directly or through other waiting
	/// builders, is waiting for the current thread.
	pub fn wait_for(&self, key: TypeKey) -> Result<WaitGuard<'_>, CycleError> {
		let me = thread::current().id();
		let mut state = self.state();

		let mut chain = vec![key];
		let mut next = key;
		while let Some(&builder) = state.builders.get(&next.id()) {
			if builder == me {
				debug!(
					target_type = key.name(),
					depth = chain.len(),
					"cross-thread dependency cycle detected"
				);
				return Err(CycleError::CircularDependency {
					type_name: key.name().to_string(),
					path: waiting_cycle_path(&chain),
				});
			}
			match state.waiting.get(&builder) {
				Some(&waited) if !chain.contains(&waited) => {
					chain.push(waited);
					next = waited;
				}
				_ => break,
			}
		}

		state.waiting.insert(me, key);
		Ok(WaitGuard { graph: self, key })
	}

	fn state(&self) -> std::sync::MutexGuard<'_, GraphState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

/// Releases a claim made with [`ConstructionGraph::claim`].
#[derive(Debug)]
pub struct ClaimGuard<'a> {
	graph: &'a ConstructionGraph,
	key: TypeKey,
}

impl Drop for ClaimGuard<'_> {
	fn drop(&mut self) {
		let me = thread::current().id();
		let mut state = self.graph.state();
		if state.builders.get(&self.key.id()) == Some(&me) {
			state.builders.remove(&self.key.id());
		}
	}
}

/// Withdraws an announcement made with [`ConstructionGraph::wait_for`].
#[derive(Debug)]
pub struct WaitGuard<'a> {
	graph: &'a ConstructionGraph,
	key: TypeKey,
}

impl Drop for WaitGuard<'_> {
	fn drop(&mut self) {
		let me = thread::current().id();
		let mut state = self.graph.state();
		if state.waiting.get(&me) == Some(&self.key) {
			state.waiting.remove(&me);
		}
	}
}

/// `chain` starts at the awaited key and ends at a key the current thread
/// builds; the cycle reads from the latter.
fn waiting_cycle_path(chain: &[TypeKey]) -> String {
	let Some((own, awaited)) = chain.split_last() else {
		return String::new();
	};
	let mut names = vec![own.short_name()];
	names.extend(awaited.iter().map(TypeKey::short_name));
	names.push(own.short_name());
	names.join(" -> ")
}

/// Circular dependency error
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
	/// Circular dependency detected
	#[error(
		"Circular dependency detected: {type_name}\n  Path: {path}\nThis forms a cycle that cannot be resolved."
	)]
	CircularDependency {
		/// Name of the type involved in the cycle
		type_name: String,
		/// Circular path (format: A -> B -> C -> A)
		path: String,
	},

	/// Maximum resolution depth exceeded
	#[error(
		"Maximum resolution depth exceeded: {0}\nThis likely indicates an extremely deep dependency chain."
	)]
	MaxDepthExceeded(usize),

	/// No cycle detection scope is active
	#[error(
		"Cycle detection called outside of a resolution scope. Use `with_cycle_detection_scope` to initialize."
	)]
	NoScope,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::marker::PhantomData;

	struct TypeA;
	struct TypeB;
	struct TypeC;

	#[rstest]
	fn test_simple_cycle_detection() {
		with_cycle_detection_scope(DEFAULT_MAX_RESOLUTION_DEPTH, || {
			// Arrange
			let type_a = TypeKey::of::<TypeA>();

			// Act
			let guard_a = begin_resolution(type_a).unwrap();

			// Assert: Attempting to resolve TypeA again should cause circular error
			let result = begin_resolution(type_a);
			assert!(matches!(result, Err(CycleError::CircularDependency { .. })));

			// Act: Drop guard to cleanup
			drop(guard_a);

			// Assert: After cleanup, resolution should succeed again
			assert!(begin_resolution(type_a).is_ok());
		});
	}

	#[rstest]
	fn test_depth_tracking() {
		with_cycle_detection_scope(DEFAULT_MAX_RESOLUTION_DEPTH, || {
			// Arrange & Act
			let guard1 = begin_resolution(TypeKey::of::<PhantomData<[u8; 0]>>()).unwrap();
			let guard2 = begin_resolution(TypeKey::of::<PhantomData<[u8; 1]>>()).unwrap();

			// Assert
			assert_eq!(current_depth(), Some(2));
			drop(guard2);
			assert_eq!(current_depth(), Some(1));
			drop(guard1);
			assert_eq!(current_depth(), Some(0));
		});
	}

	#[rstest]
	fn test_depth_limit() {
		with_cycle_detection_scope(2, || {
			// Arrange
			let _guard1 = begin_resolution(TypeKey::of::<TypeA>()).unwrap();
			let _guard2 = begin_resolution(TypeKey::of::<TypeB>()).unwrap();

			// Act
			let result = begin_resolution(TypeKey::of::<TypeC>());

			// Assert
			assert!(matches!(result, Err(CycleError::MaxDepthExceeded(3))));
			assert_eq!(current_depth(), Some(2));
		});
	}

	#[rstest]
	fn test_no_scope_returns_error() {
		// Arrange: Do NOT wrap in with_cycle_detection_scope

		// Act
		let result = begin_resolution(TypeKey::of::<TypeA>());

		// Assert
		assert!(matches!(result, Err(CycleError::NoScope)));
		assert_eq!(current_depth(), None);
	}

	#[rstest]
	fn test_nested_scope_reuses_existing() {
		with_cycle_detection_scope(DEFAULT_MAX_RESOLUTION_DEPTH, || {
			// Arrange
			let type_a = TypeKey::of::<TypeA>();
			let _guard_a = begin_resolution(type_a).unwrap();

			// Act: Nested scope call should reuse existing state
			with_cycle_detection_scope(DEFAULT_MAX_RESOLUTION_DEPTH, || {
				// Assert: TypeA should still be detected as circular
				let result = begin_resolution(type_a);
				assert!(
					matches!(result, Err(CycleError::CircularDependency { .. })),
					"Nested scope should share state with outer scope"
				);
			});
		});
	}

	#[rstest]
	fn test_scope_is_cleared_after_outermost_call() {
		// Arrange
		with_cycle_detection_scope(DEFAULT_MAX_RESOLUTION_DEPTH, || {
			std::mem::forget(begin_resolution(TypeKey::of::<TypeA>()).unwrap());
		});

		// Act
		let result = with_cycle_detection_scope(DEFAULT_MAX_RESOLUTION_DEPTH, || {
			begin_resolution(TypeKey::of::<TypeA>()).map(drop)
		});

		// Assert
		assert!(result.is_ok());
	}

	#[rstest]
	fn test_cycle_path_display() {
		with_cycle_detection_scope(DEFAULT_MAX_RESOLUTION_DEPTH, || {
			// Arrange
			let type_a = TypeKey::of::<TypeA>();

			// Act: Build a chain A -> B -> C -> A
			let _guard_a = begin_resolution(type_a).unwrap();
			let _guard_b = begin_resolution(TypeKey::of::<TypeB>()).unwrap();
			let _guard_c = begin_resolution(TypeKey::of::<TypeC>()).unwrap();
			let result = begin_resolution(type_a);

			// Assert
			match result {
				Err(CycleError::CircularDependency { path, .. }) => {
					assert_eq!(path, "TypeA -> TypeB -> TypeC -> TypeA");
				}
				other => panic!("Expected CircularDependency, got {:?}", other),
			}
		});
	}

	#[rstest]
	fn test_waiting_for_a_key_built_by_another_thread_is_allowed() {
		// Arrange
		let graph = ConstructionGraph::new();
		let key = TypeKey::of::<TypeA>();

		// Act
		let result = thread::scope(|s| {
			let _claim = graph.claim(key);
			s.spawn(|| graph.wait_for(key).map(drop)).join()
		});

		// Assert
		assert!(matches!(result, Ok(Ok(()))));
	}

	#[rstest]
	fn test_waiting_for_own_claim_is_a_cycle() {
		// Arrange
		let graph = ConstructionGraph::new();
		let key = TypeKey::of::<TypeA>();
		let _claim = graph.claim(key);

		// Act
		let result = graph.wait_for(key);

		// Assert
		match result {
			Err(CycleError::CircularDependency { path, .. }) => {
				assert_eq!(path, "TypeA -> TypeA");
			}
			other => panic!("Expected CircularDependency, got {:?}", other),
		}
	}

	#[rstest]
	fn test_wait_chain_back_to_current_thread_is_a_cycle() {
		// Arrange: this thread builds A; another thread builds B and waits for A
		let graph = ConstructionGraph::new();
		let type_a = TypeKey::of::<TypeA>();
		let type_b = TypeKey::of::<TypeB>();
		let _claim_a = graph.claim(type_a);
		let (claimed, release) = (std::sync::Barrier::new(2), std::sync::Barrier::new(2));

		thread::scope(|s| {
			s.spawn(|| {
				let _claim_b = graph.claim(type_b);
				let _wait_a = graph.wait_for(type_a).unwrap();
				claimed.wait();
				release.wait();
			});
			claimed.wait();

			// Act
			let result = graph.wait_for(type_b);
			release.wait();

			// Assert
			match result {
				Err(CycleError::CircularDependency { path, .. }) => {
					assert_eq!(path, "TypeA -> TypeB -> TypeA");
				}
				other => panic!("Expected CircularDependency, got {:?}", other),
			}
		});
	}

	#[rstest]
	fn test_released_claims_no_longer_form_cycles() {
		// Arrange
		let graph = ConstructionGraph::new();
		let key = TypeKey::of::<TypeA>();
		drop(graph.claim(key));

		// Act
		let result = graph.wait_for(key);

		// Assert
		assert!(result.is_ok());
	}
}
