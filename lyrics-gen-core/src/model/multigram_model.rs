use std::collections::BTreeMap;
use std::path::Path;
use std::thread;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ngram_model::NGramModel;
use super::persistence::{self, MULTI_MAGIC};
use super::sampler::Flatten;
use crate::error::ModelError;

/// A set of n-gram models of different orders trained on the same corpus.
///
/// This struct manages:
/// - `ngrams`: a map from order to its `NGramModel`
/// - `max_order`: the order of the primary model, used first when generating
/// - `backoff`: whether unseen primary contexts may fall through to shorter ones
///
/// With back-off enabled, every order from 1 to `max_order` is present, so
/// a context unseen by the primary model can fall through to shorter ones.
///
/// # Invariants
/// - `ngrams` always contains `max_order`
/// - Each model is stored under its own order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MultiGramModel {
	max_order: usize,
	backoff: bool,
	ngrams: BTreeMap<usize, NGramModel>,
}

impl MultiGramModel {
	/// Creates an empty set whose primary model has order `max_order`.
	///
	/// With `backoff`, models of every order in `1..max_order` are created
	/// too; otherwise the set only holds the primary model.
	///
	/// # Errors
	/// Returns `ModelError::InvalidOrder` if `max_order == 0`.
	pub fn new(max_order: usize, backoff: bool) -> Result<Self, ModelError> {
		let mut ngrams = BTreeMap::new();
		ngrams.insert(max_order, NGramModel::new(max_order)?);
		if backoff {
			for order in 1..max_order {
				ngrams.insert(order, NGramModel::new(order)?);
			}
		}
		Ok(Self { max_order, backoff, ngrams })
	}

	/// Wraps a single trained model, without back-off.
	pub fn from_model(model: NGramModel) -> Self {
		let max_order = model.order();
		let mut ngrams = BTreeMap::new();
		ngrams.insert(max_order, model);
		Self { max_order, backoff: false, ngrams }
	}

	pub fn max_order(&self) -> usize {
		self.max_order
	}

	/// Orders held by the set, ascending.
	pub fn orders(&self) -> Vec<usize> {
		self.ngrams.keys().copied().collect()
	}

	/// Returns `true` if unseen primary contexts may fall through to the
	/// lower-order models.
	pub fn has_backoff(&self) -> bool {
		self.backoff
	}

	pub fn get(&self, order: usize) -> Option<&NGramModel> {
		self.ngrams.get(&order)
	}

	/// The model of order `max_order`.
	pub fn primary(&self) -> &NGramModel {
		// Present by construction, checked again on load
		&self.ngrams[&self.max_order]
	}

	/// Trains every model of the set on the same tokenized sentences.
	///
	/// Models are independent, so each order is trained on its own thread.
	pub fn train(&mut self, sentences: &[Vec<String>]) {
		thread::scope(|scope| {
			for model in self.ngrams.values_mut() {
				scope.spawn(move || model.train_parallel(sentences));
			}
		});
		debug!(
			"trained {} model(s) on {} sentences, primary has {} states",
			self.ngrams.len(),
			sentences.len(),
			self.primary().len()
		);
	}

	/// Samples a token from a lower-order model when the primary context
	/// is unseen.
	///
	/// Tries the trailing `o` tokens of `history` for `o` from
	/// `max_order - 1` down to 1 and samples from the first model that knows
	/// the context. If none does, falls back to a random context of the
	/// order-1 model, ignoring position entirely.
	///
	/// Returns `None` if no model can produce a token.
	pub fn backoff_predict<R: Rng + ?Sized>(
		&self,
		history: &[String],
		temperature: f64,
		flatten: Flatten,
		rng: &mut R,
	) -> Option<String> {
		for order in (1..self.max_order).rev() {
			let Some(model) = self.ngrams.get(&order) else { continue };
			if history.len() < order {
				continue;
			}
			let context = &history[history.len() - order..];
			if let Some(token) = model.predict(context, temperature, flatten, rng) {
				return Some(token);
			}
		}

		let unigram = self.ngrams.get(&1)?;
		let context = unigram.random_context(rng)?;
		unigram.predict(context, temperature, flatten, rng)
	}

	/// Merges another set into this one.
	///
	/// # Errors
	/// Returns `ModelError::OrderMismatch` if the primary orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.max_order != other.max_order {
			return Err(ModelError::OrderMismatch { expected: self.max_order, found: other.max_order });
		}
		self.backoff |= other.backoff;

		for (order, model) in &other.ngrams {
			if let Some(existing) = self.ngrams.get_mut(order) {
				existing.merge(model)?;
			} else {
				self.ngrams.insert(*order, model.clone());
			}
		}

		Ok(())
	}

	fn validate(&self) -> Result<(), ModelError> {
		if !self.ngrams.contains_key(&self.max_order) {
			return Err(ModelError::Corrupt(format!("missing primary model of order {}", self.max_order)));
		}
		for (order, model) in &self.ngrams {
			if *order != model.order() || *order > self.max_order {
				return Err(ModelError::Corrupt(format!(
					"model of order {} stored under order {}",
					model.order(),
					order
				)));
			}
			model.validate()?;
		}
		Ok(())
	}

	/// Serializes every model of the set.
	pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
		persistence::encode(MULTI_MAGIC, self)
	}

	/// Reconstructs a set from bytes produced by [`MultiGramModel::to_bytes`].
	///
	/// # Errors
	/// Returns `ModelError::Corrupt` on malformed or foreign data.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
		let model: MultiGramModel = persistence::decode(MULTI_MAGIC, bytes)?;
		model.validate()?;
		Ok(model)
	}

	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
		persistence::write_atomic(&path, &self.to_bytes()?)?;
		info!("model set {:?} saved to {}", self.orders(), path.as_ref().display());
		Ok(())
	}

	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
		let bytes = std::fs::read(&path)?;
		let model = Self::from_bytes(&bytes)?;
		info!("model set {:?} loaded from {}", model.orders(), path.as_ref().display());
		Ok(model)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn sentences(lines: &[&str]) -> Vec<Vec<String>> {
		lines
			.iter()
			.map(|l| l.split_whitespace().map(str::to_owned).collect())
			.collect()
	}

	fn key(tokens: &[&str]) -> Vec<String> {
		tokens.iter().map(|t| t.to_string()).collect()
	}

	#[test]
	fn backoff_creates_every_order() {
		let set = MultiGramModel::new(3, true).unwrap();
		assert_eq!(set.orders(), vec![1, 2, 3]);
		assert!(set.has_backoff());

		let set = MultiGramModel::new(3, false).unwrap();
		assert_eq!(set.orders(), vec![3]);
		assert!(!set.has_backoff());
	}

	#[test]
	fn every_order_is_trained() {
		let mut set = MultiGramModel::new(2, true).unwrap();
		set.train(&sentences(&["the cat sat", "a dog"]));
		assert_eq!(set.get(2).unwrap().len(), 1);
		// "the cat sat" -> 2 contexts, "a dog" -> 1
		assert_eq!(set.get(1).unwrap().len(), 3);
	}

	#[test]
	fn backoff_prefers_longest_matching_order() {
		let mut set = MultiGramModel::new(3, true).unwrap();
		set.train(&sentences(&["x b c d", "y c e"]));
		let mut rng = StdRng::seed_from_u64(5);
		// ("a","b","c") unseen; order 2 ("b","c") -> "d"
		let history = key(&["a", "b", "c"]);
		for _ in 0..20 {
			assert_eq!(set.backoff_predict(&history, 1.0, Flatten::Distinct, &mut rng), Some("d".to_owned()));
		}
	}

	#[test]
	fn backoff_falls_through_to_random_unigram() {
		let mut set = MultiGramModel::new(3, true).unwrap();
		set.train(&sentences(&["p q"]));
		let mut rng = StdRng::seed_from_u64(9);
		// Nothing matches "c", the only unigram context is "p"
		let history = key(&["a", "b", "c"]);
		assert_eq!(set.backoff_predict(&history, 1.0, Flatten::Distinct, &mut rng), Some("q".to_owned()));
	}

	#[test]
	fn unigram_primary_with_backoff_jumps_to_random_context() {
		let mut set = MultiGramModel::new(1, true).unwrap();
		set.train(&sentences(&["p q"]));
		let mut rng = StdRng::seed_from_u64(2);
		assert_eq!(set.backoff_predict(&key(&["q"]), 1.0, Flatten::Distinct, &mut rng), Some("q".to_owned()));
	}

	#[test]
	fn no_backoff_without_lower_orders() {
		let mut set = MultiGramModel::new(2, false).unwrap();
		set.train(&sentences(&["a b c"]));
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(set.backoff_predict(&key(&["z", "z"]), 1.0, Flatten::Distinct, &mut rng), None);
	}

	#[test]
	fn corrupt_set_is_rejected() {
		let mut set = MultiGramModel::new(2, true).unwrap();
		set.train(&sentences(&["a b c"]));
		let mut bytes = set.to_bytes().unwrap();
		assert_eq!(MultiGramModel::from_bytes(&bytes).unwrap(), set);

		bytes.truncate(bytes.len() - 3);
		assert!(matches!(MultiGramModel::from_bytes(&bytes), Err(ModelError::Corrupt(_))));

		// A single-model stream is a foreign format for a set
		let single = set.get(2).unwrap().to_bytes().unwrap();
		assert!(matches!(MultiGramModel::from_bytes(&single), Err(ModelError::Corrupt(_))));
	}

	#[test]
	fn from_model_wraps_primary() {
		let mut model = NGramModel::new(2).unwrap();
		model.train(&sentences(&["a b c"]));
		let set = MultiGramModel::from_model(model.clone());
		assert_eq!(set.primary(), &model);
		assert_eq!(set.max_order(), 2);
	}
}
