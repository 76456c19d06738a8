use rand::Rng;

use serde::{Deserialize, Serialize};

use super::sampler::{self, Flatten};

/// Represents a state in an n-gram model.
///
/// A `State` holds every token observed right after one context, in the
/// order they were observed. Repeats are kept: a token seen three times
/// after the context appears three times in `followers`.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their multiplicity.
///
/// ## Invariants
/// - A state stored in a model is never empty
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Observed next tokens, insertion order preserved.
	followers: Vec<String>,
}

impl State {
	/// Creates a new empty state.
	pub fn new() -> Self {
		Self { followers: Vec::new() }
	}

	/// Records an occurrence of `next_token` after this state's context.
	pub fn add_transition(&mut self, next_token: String) {
		self.followers.push(next_token);
	}

	/// Predicts the next token following the temperature rule.
	///
	/// Returns `None` if the state has no transitions.
	pub fn predict<R: Rng + ?Sized>(&self, temperature: f64, flatten: Flatten, rng: &mut R) -> Option<String> {
		sampler::sample(&self.followers, temperature, flatten, rng).cloned()
	}

	/// Appends the followers of another state with the same context.
	pub fn merge(&mut self, other: &Self) {
		self.followers.extend(other.followers.iter().cloned());
	}

	pub fn followers(&self) -> &[String] {
		&self.followers
	}

	pub fn len(&self) -> usize {
		self.followers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.followers.is_empty()
	}
}
