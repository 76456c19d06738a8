//! N-gram-based lyrics generation library.
//!
//! This crate provides a word-level Markov chain generator including:
//! - Tokenization of raw lyrics (whitespace or word/punctuation extraction)
//! - Fixed-order n-gram models with append-only training and persistence
//! - Multi-order back-off sets
//! - Temperature-controlled sampling and verse rendering
//! - Corpus ingestion of text, CSV and JSON lyric files
//!
//! Typical use: read a corpus, train a [`Generator`], then generate.
//!
//! ```no_run
//! use lyrics_gen_core::{corpus, Generator, GeneratorConfig};
//!
//! let config = GeneratorConfig::default();
//! let sentences = corpus::read_corpus("./data", &config.corpus);
//! let mut generator = Generator::new(&config)?;
//! generator.train(&sentences);
//! for line in generator.generate(&generator.make_prediction_input())? {
//!     println!("{line}");
//! }
//! # Ok::<(), lyrics_gen_core::ModelError>(())
//! ```

/// Core n-gram models and generation logic.
pub mod model;

/// Text segmentation shared by training and seeding.
pub mod tokenizer;

/// Corpus ingestion (text, CSV and JSON lyric files).
pub mod corpus;

/// Generator configuration.
pub mod config;

/// Error taxonomy.
pub mod error;

/// I/O utilities (file loading, path helpers).
pub(crate) mod io;

pub use config::GeneratorConfig;
pub use error::ModelError;
pub use io::normalize_folder;
pub use model::generator::Generator;
pub use tokenizer::Tokenizer;
