use std::io;

/// Errors raised by model construction, generation and persistence.
///
/// Per-sentence and per-file problems (a sentence too short to train on, an
/// unreadable corpus file) are never reported here: they are logged and
/// skipped.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
	/// Generation was requested on a model whose transition table is empty.
	#[error("model has not been trained: no context available to start from")]
	Untrained,

	/// A persisted model could not be decoded or violates the model invariants.
	#[error("corrupt model data: {0}")]
	Corrupt(String),

	/// A model order of zero was requested.
	#[error("invalid model order {0}, must be >= 1")]
	InvalidOrder(usize),

	/// Two models of different orders were merged.
	#[error("order mismatch: expected {expected}, found {found}")]
	OrderMismatch { expected: usize, found: usize },

	/// Temperature must be strictly positive and finite.
	#[error("invalid temperature {0}, must be > 0.0")]
	InvalidTemperature(f64),

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

impl From<postcard::Error> for ModelError {
	fn from(e: postcard::Error) -> Self {
		ModelError::Corrupt(e.to_string())
	}
}
