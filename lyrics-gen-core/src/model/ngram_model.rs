use std::collections::BTreeMap;
use std::path::Path;
use std::thread;

use log::{debug, info, trace};
use rand::Rng;
use rand::prelude::IteratorRandom;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::persistence::{self, MODEL_MAGIC};
use super::sampler::Flatten;
use super::state::State;
use crate::error::ModelError;

/// A fixed-length sequence of consecutive tokens used as a lookup key.
pub type Context = Vec<String>;

/// Represents a word-level n-gram model of a fixed order.
///
/// The `NGramModel` maps every context of `order` tokens to the tokens
/// observed right after it, and remembers the contexts that opened a
/// training sentence.
///
/// # Responsibilities
/// - Build the transition table from tokenized sentences (append-only)
/// - Predict the next token given a context
/// - Merge with another model of the same order
/// - Serialize to and from bytes without retraining
///
/// # Invariants
/// - `order` is always >= 1
/// - Every key in `states` and every entry in `starts` has length `order`
/// - Every state holds at least one follower
/// - `states` is empty iff no sentence longer than `order` was trained on
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NGramModel {
	/// The order of the model (number of tokens in a context)
	order: usize,

	/// Mapping from a context to its followers
	states: BTreeMap<Context, State>,

	/// Contexts that began a training sentence, duplicates kept
	starts: Vec<Context>,
}

impl NGramModel {
	/// Creates a new empty model of the given order.
	///
	/// # Errors
	/// Returns `ModelError::InvalidOrder` if `order == 0`.
	pub fn new(order: usize) -> Result<Self, ModelError> {
		if order == 0 {
			return Err(ModelError::InvalidOrder(order));
		}
		Ok(Self { order, states: BTreeMap::new(), starts: Vec::new() })
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct contexts in the transition table.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	/// Returns `true` if the transition table is empty.
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Contexts that began a training sentence.
	pub fn starts(&self) -> &[Context] {
		&self.starts
	}

	/// Iterates over `(context, followers)` pairs in key order.
	pub fn transitions(&self) -> impl Iterator<Item = (&Context, &[String])> {
		self.states.iter().map(|(k, s)| (k, s.followers()))
	}

	/// Returns the followers recorded for `context`, if any.
	pub fn followers(&self, context: &[String]) -> Option<&[String]> {
		self.states.get(context).map(State::followers)
	}

	pub fn contains(&self, context: &[String]) -> bool {
		self.states.contains_key(context)
	}

	/// Picks a random entry of the start set.
	///
	/// Returns `None` if no sentence has been trained on.
	pub fn random_start<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Context> {
		self.starts.choose(rng)
	}

	/// Picks a uniformly random context from the transition table.
	///
	/// Returns `None` if the table is empty.
	pub fn random_context<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Context> {
		self.states.keys().choose(rng)
	}

	/// Adds one tokenized sentence to the model.
	///
	/// # Notes
	/// - Tokens are lowercased.
	/// - Sentences of `order` tokens or fewer are skipped: they cannot form
	///   a single context/next pair.
	pub fn add_sentence<S: AsRef<str>>(&mut self, tokens: &[S]) {
		if tokens.len() <= self.order {
			trace!("skipping sentence of {} tokens for order {}", tokens.len(), self.order);
			return;
		}

		let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_lowercase()).collect();
		self.starts.push(tokens[..self.order].to_vec());

		for window in tokens.windows(self.order + 1) {
			let (context, next) = window.split_at(self.order);
			// `next` holds exactly one token
			if let Some(next_token) = next.first() {
				self.states
					.entry(context.to_vec())
					.or_default()
					.add_transition(next_token.clone());
			}
		}
	}

	/// Trains the model on a sequence of tokenized sentences.
	///
	/// Training is additive: calling it twice with the same input doubles
	/// every follower list. An empty input is a no-op.
	pub fn train<S: AsRef<str>>(&mut self, sentences: &[Vec<S>]) {
		for sentence in sentences {
			self.add_sentence(sentence);
		}
		debug!(
			"trained order {} model: {} states, {} start states",
			self.order,
			self.states.len(),
			self.starts.len()
		);
	}

	/// Trains on `sentences` using all CPU cores.
	///
	/// The input is split into chunks, a partial model is built for each
	/// chunk on its own thread, and the partial models are merged back in
	/// chunk order. The result is identical to [`NGramModel::train`].
	pub fn train_parallel<S: AsRef<str> + Sync>(&mut self, sentences: &[Vec<S>]) {
		if sentences.is_empty() {
			return;
		}

		let chunks = num_cpus::get() * 8;
		let chunk_size = sentences.len().div_ceil(chunks);
		let order = self.order;

		let partial_models: Vec<NGramModel> = thread::scope(|scope| {
			let handles: Vec<_> = sentences
				.chunks(chunk_size)
				.map(|chunk| {
					scope.spawn(move || {
						let mut partial_model = NGramModel { order, states: BTreeMap::new(), starts: Vec::new() };
						for sentence in chunk {
							partial_model.add_sentence(sentence);
						}
						partial_model
					})
				})
				.collect();

			handles
				.into_iter()
				.map(|handle| match handle.join() {
					Ok(model) => model,
					Err(payload) => std::panic::resume_unwind(payload),
				})
				.collect()
		});

		for partial_model in partial_models {
			self.absorb(partial_model);
		}
		debug!(
			"trained order {} model in parallel: {} states, {} start states",
			self.order,
			self.states.len(),
			self.starts.len()
		);
	}

	/// Predicts the next token for `context`.
	///
	/// Returns `None` if the context is unknown.
	pub fn predict<R: Rng + ?Sized>(
		&self,
		context: &[String],
		temperature: f64,
		flatten: Flatten,
		rng: &mut R,
	) -> Option<String> {
		self.states.get(context)?.predict(temperature, flatten, rng)
	}

	/// Merges another model into this one.
	///
	/// Followers of shared contexts and start entries are appended after
	/// the existing ones.
	///
	/// # Errors
	/// Returns `ModelError::OrderMismatch` if the orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.order != other.order {
			return Err(ModelError::OrderMismatch { expected: self.order, found: other.order });
		}

		for (context, state) in &other.states {
			if let Some(existing) = self.states.get_mut(context) {
				existing.merge(state);
			} else {
				self.states.insert(context.clone(), state.clone());
			}
		}
		self.starts.extend(other.starts.iter().cloned());

		Ok(())
	}

	/// Same as `merge` for an owned model of the same order, without cloning.
	fn absorb(&mut self, other: NGramModel) {
		for (context, state) in other.states {
			match self.states.get_mut(&context) {
				Some(existing) => existing.merge(&state),
				None => {
					self.states.insert(context, state);
				}
			}
		}
		self.starts.extend(other.starts);
	}

	/// Checks the structural invariants of a decoded model.
	pub(crate) fn validate(&self) -> Result<(), ModelError> {
		if self.order == 0 {
			return Err(ModelError::Corrupt("model order is 0".to_owned()));
		}
		for (context, state) in &self.states {
			if context.len() != self.order {
				return Err(ModelError::Corrupt(format!(
					"context of length {} in order {} model",
					context.len(),
					self.order
				)));
			}
			if state.is_empty() {
				return Err(ModelError::Corrupt("context without followers".to_owned()));
			}
		}
		if let Some(start) = self.starts.iter().find(|s| s.len() != self.order) {
			return Err(ModelError::Corrupt(format!(
				"start entry of length {} in order {} model",
				start.len(),
				self.order
			)));
		}
		Ok(())
	}

	/// Serializes the model (order, table and start set).
	pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
		persistence::encode(MODEL_MAGIC, self)
	}

	/// Reconstructs a model from bytes produced by [`NGramModel::to_bytes`].
	///
	/// # Errors
	/// Returns `ModelError::Corrupt` if the stream is malformed, foreign, or
	/// decodes to a model violating the invariants.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
		let model: NGramModel = persistence::decode(MODEL_MAGIC, bytes)?;
		model.validate()?;
		Ok(model)
	}

	/// Saves the model to `path`, replacing any existing file atomically.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
		persistence::write_atomic(&path, &self.to_bytes()?)?;
		info!("order {} model saved to {}", self.order, path.as_ref().display());
		Ok(())
	}

	/// Loads a model previously written by [`NGramModel::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
		let bytes = std::fs::read(&path)?;
		let model = Self::from_bytes(&bytes)?;
		info!(
			"order {} model loaded from {}: {} states",
			model.order,
			path.as_ref().display(),
			model.states.len()
		);
		Ok(model)
	}
}
