use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Word runs or one of the four punctuation marks kept as tokens.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
	// Static pattern, cannot fail
	Regex::new(r"\b\w+\b|[.!?,]").unwrap()
});

/// Punctuation marks produced as standalone tokens by `WordsAndPunctuation`.
pub const PUNCTUATION: [&str; 4] = [".", "!", "?", ","];

/// Strategy used to segment raw text into tokens.
///
/// The same tokenizer must be used for training and for seed tokenization,
/// otherwise seeds will not match any trained context.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tokenizer {
	/// Split on whitespace. Punctuation stays attached to words.
	Whitespace,
	/// Extract word runs and `. ! ? ,` as separate tokens.
	#[default]
	WordsAndPunctuation,
}

impl Tokenizer {
	/// Segments `text` into lowercased tokens.
	///
	/// Empty or whitespace-only input yields an empty vector.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		match self {
			Tokenizer::Whitespace => text.split_whitespace().map(str::to_lowercase).collect(),
			Tokenizer::WordsAndPunctuation => TOKEN_RE
				.find_iter(text)
				.map(|m| m.as_str().to_lowercase())
				.collect(),
		}
	}

	/// Whether punctuation marks come out as their own tokens, and therefore
	/// need to be glued back onto the preceding word when rendering.
	pub fn splits_punctuation(&self) -> bool {
		matches!(self, Tokenizer::WordsAndPunctuation)
	}
}

/// Returns `true` if `token` is exactly one of `. ! ? ,`.
pub fn is_punctuation(token: &str) -> bool {
	PUNCTUATION.contains(&token)
}

/// Returns `true` if `token` ends a sentence (`.`, `!` or `?`).
pub fn ends_sentence(token: &str) -> bool {
	token.ends_with(['.', '!', '?'])
}

/// Returns `true` if `token` ends a clause (sentence mark or `,`).
pub fn ends_clause(token: &str) -> bool {
	token.ends_with(['.', '!', '?', ','])
}

/// Joins tokens with spaces, gluing punctuation tokens onto the preceding
/// word when `reassemble` is set.
///
/// `breaks[i] == true` requests a line break after token `i`. The break is
/// held back until the next word so that trailing punctuation stays on the
/// line it belongs to.
pub(crate) fn render(tokens: &[String], breaks: &[bool], reassemble: bool) -> String {
	let mut out = String::new();
	let mut pending_break = false;

	for (i, token) in tokens.iter().enumerate() {
		if reassemble && is_punctuation(token) && !out.is_empty() {
			out.push_str(token);
		} else {
			if !out.is_empty() {
				out.push(if pending_break { '\n' } else { ' ' });
			}
			pending_break = false;
			out.push_str(token);
		}
		if breaks.get(i).copied().unwrap_or(false) {
			pending_break = true;
		}
	}

	out
}
