//! Top-level module for the n-gram generation system.
//!
//! This module provides a multi-order n-gram lyrics generator, including:
//! - Fixed-order n-gram models (`NGramModel`)
//! - Multi-order back-off sets (`MultiGramModel`)
//! - Internal state management (`State`)
//! - Temperature sampling (`sampler`)
//! - Generation parameters (`PredictionInput`)
//! - A high-level generation interface (`Generator`)

/// High-level interface for generating lyrics from a model set.
///
/// Handles seeding, the sampling loop with back-off, early stopping in
/// verse mode and punctuation re-assembly.
pub mod generator;

/// Set of n-gram models of orders `1..=max_order` trained together.
///
/// Supports back-off prediction, merging and persistence.
pub mod multigram_model;

/// Fixed-order n-gram model (`order >= 1`).
///
/// Handles sentence ingestion, transition recording, next-token
/// prediction, model merging and persistence.
pub mod ngram_model;

/// Follower list of a single context.
///
/// Not exposed publicly.
mod state;

/// Weighted random selection and the temperature rule.
pub mod sampler;

/// Generation parameters: count, length, temperature, seed, output mode.
pub mod prediction_input;

/// Byte format and atomic file writes.
mod persistence;
