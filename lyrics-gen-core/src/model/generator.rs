use std::path::Path;

use log::debug;
use rand::Rng;

use crate::config::GeneratorConfig;
use crate::error::ModelError;
use crate::model::multigram_model::MultiGramModel;
use crate::model::prediction_input::{OutputMode, PredictionInput, StartSeed, TOKEN_CAP};
use crate::tokenizer::{self, Tokenizer};

/// High-level generator over a set of n-gram models.
///
/// # Responsibilities
/// - Tokenize and train the model set
/// - Seed every output unit from the start set or a user seed
/// - Walk the chain with back-off and temperature-controlled sampling
/// - Render tokens back into text (punctuation re-assembly, line breaks)
#[derive(Debug, Clone)]
pub struct Generator {
	model: MultiGramModel,
	tokenizer: Tokenizer,
}

impl Generator {
	/// Creates an untrained generator from a configuration.
	///
	/// # Errors
	/// Returns `ModelError::InvalidOrder` if `config.order == 0`.
	pub fn new(config: &GeneratorConfig) -> Result<Self, ModelError> {
		Ok(Self {
			model: MultiGramModel::new(config.order, config.backoff)?,
			tokenizer: config.tokenizer,
		})
	}

	/// Wraps an already trained (typically loaded) model set.
	///
	/// `tokenizer` must be the one the set was trained with.
	pub fn from_model(model: MultiGramModel, tokenizer: Tokenizer) -> Self {
		Self { model, tokenizer }
	}

	/// Loads a model set saved with [`Generator::save`].
	pub fn load<P: AsRef<Path>>(path: P, tokenizer: Tokenizer) -> Result<Self, ModelError> {
		Ok(Self::from_model(MultiGramModel::load(path)?, tokenizer))
	}

	/// Saves the model set. The tokenizer is not part of the stream.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
		self.model.save(path)
	}

	pub fn model(&self) -> &MultiGramModel {
		&self.model
	}

	pub fn tokenizer(&self) -> Tokenizer {
		self.tokenizer
	}

	/// Tokenizes raw sentences and trains every model of the set.
	///
	/// Sentences yielding too few tokens are skipped silently.
	pub fn train<S: AsRef<str>>(&mut self, sentences: &[S]) {
		let tokenized: Vec<Vec<String>> = sentences
			.iter()
			.map(|s| self.tokenizer.tokenize(s.as_ref()))
			.filter(|tokens| !tokens.is_empty())
			.collect();
		self.train_tokens(&tokenized);
	}

	/// Trains every model of the set on already tokenized sentences.
	pub fn train_tokens(&mut self, sentences: &[Vec<String>]) {
		self.model.train(sentences);
	}

	/// Creates a new `PredictionInput` with default values.
	pub fn make_prediction_input(&self) -> PredictionInput {
		PredictionInput::default()
	}

	/// Generates `input.count` strings using the thread-local RNG.
	///
	/// # Errors
	/// Returns `ModelError::Untrained` if the primary model is empty.
	pub fn generate(&self, input: &PredictionInput) -> Result<Vec<String>, ModelError> {
		self.generate_with(input, &mut rand::rng())
	}

	/// Generates `input.count` strings using the given RNG.
	///
	/// The seed, if any, is applied to every string.
	///
	/// # Errors
	/// Returns `ModelError::Untrained` if the primary model is empty.
	pub fn generate_with<R: Rng + ?Sized>(&self, input: &PredictionInput, rng: &mut R) -> Result<Vec<String>, ModelError> {
		if self.model.primary().is_empty() {
			return Err(ModelError::Untrained);
		}

		let seed_tokens = match &input.start_seed {
			StartSeed::Random => Vec::new(),
			StartSeed::Custom(seed) => self.tokenizer.tokenize(seed),
		};

		let mut results = Vec::with_capacity(input.count);
		for _ in 0..input.count {
			results.push(self.generate_unit(&seed_tokens, input, rng)?);
		}
		debug!("generated {} string(s) at temperature {}", results.len(), input.temperature());
		Ok(results)
	}

	/// Builds the initial token buffer.
	///
	/// - No seed: a random start entry, or a random context without starts
	/// - Seed of at least `order` tokens: the seed itself
	/// - Shorter seed: left-padded with the head of a random start entry
	fn seed_buffer<R: Rng + ?Sized>(&self, seed_tokens: &[String], rng: &mut R) -> Result<Vec<String>, ModelError> {
		let primary = self.model.primary();
		let order = primary.order();

		if seed_tokens.len() >= order {
			return Ok(seed_tokens.to_vec());
		}

		let source = primary
			.random_start(rng)
			.or_else(|| primary.random_context(rng))
			.ok_or(ModelError::Untrained)?;

		let mut buffer: Vec<String> = source[..order - seed_tokens.len()].to_vec();
		buffer.extend(seed_tokens.iter().cloned());
		Ok(buffer)
	}

	/// Samples the token following `buffer`.
	///
	/// Returns `None` when neither the primary model nor, if enabled, the
	/// back-off chain can continue.
	fn next_token<R: Rng + ?Sized>(&self, buffer: &[String], input: &PredictionInput, rng: &mut R) -> Option<String> {
		let primary = self.model.primary();
		let context = &buffer[buffer.len().saturating_sub(primary.order())..];

		if let Some(token) = primary.predict(context, input.temperature(), input.flatten, rng) {
			return Some(token);
		}
		if self.model.has_backoff() {
			return self.model.backoff_predict(buffer, input.temperature(), input.flatten, rng);
		}
		None
	}

	fn generate_unit<R: Rng + ?Sized>(
		&self,
		seed_tokens: &[String],
		input: &PredictionInput,
		rng: &mut R,
	) -> Result<String, ModelError> {
		let mut buffer = self.seed_buffer(seed_tokens, rng)?;
		let reassemble = self.tokenizer.splits_punctuation();

		match input.mode {
			OutputMode::Samples => {
				while buffer.len() < input.max_length {
					match self.next_token(&buffer, input, rng) {
						Some(token) => buffer.push(token),
						None => break,
					}
				}
				Ok(tokenizer::render(&buffer, &[], reassemble))
			}
			OutputMode::Verse { lines, soft_line_length } => {
				let limit = input.max_length.min(TOKEN_CAP);
				let mut breaks = vec![false; buffer.len()];
				let mut completed_lines = 0;
				let mut line_length = 0;

				while completed_lines < lines && buffer.len() < limit {
					let Some(token) = self.next_token(&buffer, input, rng) else { break };

					line_length += 1;
					let mut line_break = false;
					if tokenizer::ends_clause(&token) || line_length > soft_line_length {
						line_length = 0;
						line_break = true;
						if tokenizer::ends_sentence(&token) {
							completed_lines += 1;
						}
					}
					buffer.push(token);
					breaks.push(line_break);
				}
				Ok(tokenizer::render(&buffer, &breaks, reassemble))
			}
		}
	}
}
