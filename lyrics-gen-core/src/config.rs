use serde::{Deserialize, Serialize};

use crate::corpus::CorpusConfig;
use crate::tokenizer::Tokenizer;

/// Settings used to build and train a [`Generator`](crate::model::generator::Generator).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```json
/// { "order": 3, "tokenizer": "whitespace" }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
	/// Order of the primary model.
	#[serde(default = "default_order")]
	pub order: usize,
	/// Train every lower order too and back off to them on unseen contexts.
	#[serde(default = "default_backoff")]
	pub backoff: bool,
	#[serde(default)]
	pub tokenizer: Tokenizer,
	#[serde(default)]
	pub corpus: CorpusConfig,
}

fn default_order() -> usize {
	2
}

fn default_backoff() -> bool {
	true
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			order: default_order(),
			backoff: default_backoff(),
			tokenizer: Tokenizer::default(),
			corpus: CorpusConfig::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::corpus::SentenceSplit;

	#[test]
	fn partial_json_uses_defaults() {
		let config: GeneratorConfig = serde_json::from_str(r#"{ "order": 3, "tokenizer": "whitespace" }"#).unwrap();
		assert_eq!(config.order, 3);
		assert!(config.backoff);
		assert_eq!(config.tokenizer, Tokenizer::Whitespace);
		assert_eq!(config.corpus, CorpusConfig::default());
	}

	#[test]
	fn nested_corpus_settings() {
		let config: GeneratorConfig =
			serde_json::from_str(r#"{ "corpus": { "split": "punctuation", "extensions": ["txt"] } }"#).unwrap();
		assert_eq!(config.corpus.split, SentenceSplit::Punctuation);
		assert_eq!(config.corpus.extensions, vec!["txt"]);
		assert_eq!(config.order, 2);
	}
}
