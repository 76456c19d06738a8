use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Policy applied when `temperature > 1.0`.
///
/// # Variants
/// - `Distinct`: pick uniformly among the distinct candidates, discarding
///   frequency. Every temperature above 1.0 behaves the same.
/// - `PowerLaw`: weight each distinct candidate by `count^(1/temperature)`,
///   the same rule used below 1.0, so higher values flatten progressively.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Flatten {
	#[default]
	Distinct,
	PowerLaw,
}

/// Picks an index with probability proportional to its weight.
///
/// Returns `None` if `weights` is empty, sums to zero, or contains a
/// negative or non-finite value.
pub fn weighted_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
	if weights.iter().any(|w| !w.is_finite()) {
		return None;
	}
	let distribution = WeightedIndex::new(weights.iter().copied()).ok()?;
	Some(distribution.sample(rng))
}

/// Distinct candidates in first-seen order with their occurrence counts.
fn count_distinct(candidates: &[String]) -> Vec<(&String, usize)> {
	let mut counts: Vec<(&String, usize)> = Vec::new();
	for candidate in candidates {
		match counts.iter_mut().find(|(token, _)| *token == candidate) {
			Some((_, count)) => *count += 1,
			None => counts.push((candidate, 1)),
		}
	}
	counts
}

/// Power-law weighting, falling back to a uniform pick over the raw list
/// when the weights degenerate.
///
/// Counts are scaled by the largest one first, so every weight lies in
/// `[0, 1]` and the most frequent token always weighs `1`.
fn sample_power_law<'a, R: Rng + ?Sized>(
	candidates: &'a [String],
	temperature: f64,
	rng: &mut R,
) -> Option<&'a String> {
	let counts = count_distinct(candidates);
	let exponent = 1.0 / temperature;
	let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(1) as f64;
	let weights: Vec<f64> = counts.iter().map(|(_, c)| (*c as f64 / max_count).powf(exponent)).collect();

	match weighted_index(&weights, rng) {
		Some(i) => counts.get(i).map(|(token, _)| *token),
		None => candidates.choose(rng),
	}
}

/// Samples the next token from a follower list according to `temperature`.
///
/// - `1.0`: uniform over the raw list (repeats encode frequency)
/// - `< 1.0`: distinct tokens weighted by `(count / max_count)^(1/temperature)`
/// - `> 1.0`: according to `flatten`
///
/// Returns `None` only if `candidates` is empty. The caller guarantees
/// `temperature > 0.0`.
pub fn sample<'a, R: Rng + ?Sized>(
	candidates: &'a [String],
	temperature: f64,
	flatten: Flatten,
	rng: &mut R,
) -> Option<&'a String> {
	if candidates.is_empty() {
		return None;
	}

	if temperature == 1.0 {
		candidates.choose(rng)
	} else if temperature < 1.0 {
		sample_power_law(candidates, temperature, rng)
	} else {
		match flatten {
			Flatten::Distinct => {
				let distinct: Vec<&String> = count_distinct(candidates).into_iter().map(|(t, _)| t).collect();
				distinct.choose(rng).copied()
			}
			Flatten::PowerLaw => sample_power_law(candidates, temperature, rng),
		}
	}
}
