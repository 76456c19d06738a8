use super::sampler::Flatten;
use crate::error::ModelError;

/// Hard safety cap on the number of tokens of one verse.
///
/// Cyclic contexts can otherwise keep a verse going forever when no
/// sentence mark is ever produced.
pub const TOKEN_CAP: usize = 100;

/// Default soft line length of a verse, in tokens.
pub const SOFT_LINE_LENGTH: usize = 10;

/// Strategy used to select the starting context of every output unit.
///
/// # Variants
/// - `Random`: start from a random entry of the start set (or a random
///   context when the start set is empty).
/// - `Custom(String)`: tokenize the string and start from it. Seeds shorter
///   than the model order are padded on the left from a random start entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StartSeed {
	#[default]
	Random,
	Custom(String),
}

/// Shape of each generated string.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputMode {
	/// One line of at most `max_length` tokens. No early stop.
	#[default]
	Samples,
	/// A whole text broken into lines.
	///
	/// A clause mark, or more than `soft_line_length` tokens since the last
	/// boundary, starts a new line. A sentence mark completes one of
	/// `lines`; generation stops once all are complete, or at
	/// `min(max_length, TOKEN_CAP)` tokens.
	Verse { lines: usize, soft_line_length: usize },
}

impl OutputMode {
	/// Verse mode with the default soft line length.
	pub fn verse(lines: usize) -> Self {
		OutputMode::Verse { lines, soft_line_length: SOFT_LINE_LENGTH }
	}
}

/// Input parameters for a generation request.
///
/// # Responsibilities
/// - Track how many strings to produce and how long they may get
/// - Track the sampling temperature and the flattening policy
/// - Track the seeding strategy and the output shape
///
/// # Invariants
/// - `temperature` is always finite and > 0.0
#[derive(Clone, Debug)]
pub struct PredictionInput {
	/// Number of independent strings to generate.
	pub count: usize,

	/// Maximum number of tokens per string, seed included.
	pub max_length: usize,

	/// Sampling temperature (1.0 = raw frequencies).
	temperature: f64,

	/// Policy for temperatures above 1.0.
	pub flatten: Flatten,

	/// Seeding strategy.
	pub start_seed: StartSeed,

	/// Output shape.
	pub mode: OutputMode,
}

impl Default for PredictionInput {
	fn default() -> Self {
		Self {
			count: 5,
			max_length: 30,
			temperature: 1.0,
			flatten: Flatten::default(),
			start_seed: StartSeed::default(),
			mode: OutputMode::default(),
		}
	}
}

impl PredictionInput {
	/// Returns the current temperature.
	pub fn temperature(&self) -> f64 {
		self.temperature
	}

	/// Sets the sampling temperature.
	///
	/// # Errors
	/// Returns `ModelError::InvalidTemperature` unless the value is finite
	/// and strictly positive.
	pub fn set_temperature(&mut self, temperature: f64) -> Result<(), ModelError> {
		if !temperature.is_finite() || temperature <= 0.0 {
			return Err(ModelError::InvalidTemperature(temperature));
		}
		self.temperature = temperature;
		Ok(())
	}

	/// Sets a custom seed, or the random strategy when `seed` is blank.
	pub fn set_seed(&mut self, seed: &str) {
		self.start_seed = if seed.trim().is_empty() {
			StartSeed::Random
		} else {
			StartSeed::Custom(seed.to_owned())
		};
	}
}
