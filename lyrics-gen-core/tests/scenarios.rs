//! End-to-end scenarios on the cat corpus.

use lyrics_gen_core::model::multigram_model::MultiGramModel;
use lyrics_gen_core::model::ngram_model::NGramModel;
use lyrics_gen_core::model::prediction_input::StartSeed;
use lyrics_gen_core::{Generator, GeneratorConfig, ModelError, Tokenizer};
use rand::SeedableRng;
use rand::rngs::StdRng;

const CORPUS: [&str; 2] = ["the cat sat on the mat", "the cat ran away"];

fn key(tokens: &[&str]) -> Vec<String> {
	tokens.iter().map(|t| t.to_string()).collect()
}

fn tokenized(lines: &[&str]) -> Vec<Vec<String>> {
	lines.iter().map(|l| Tokenizer::Whitespace.tokenize(l)).collect()
}

fn cat_generator(backoff: bool) -> Generator {
	let config = GeneratorConfig { order: 2, backoff, tokenizer: Tokenizer::Whitespace, ..GeneratorConfig::default() };
	let mut generator = Generator::new(&config).unwrap();
	generator.train(&CORPUS);
	generator
}

#[test]
fn order_two_table_matches_corpus() {
	let mut model = NGramModel::new(2).unwrap();
	model.train(&tokenized(&CORPUS));

	assert_eq!(model.followers(&key(&["the", "cat"])).unwrap(), ["sat", "ran"]);
	assert_eq!(model.followers(&key(&["cat", "sat"])).unwrap(), ["on"]);
	assert_eq!(model.starts(), [key(&["the", "cat"]), key(&["the", "cat"])]);
}

#[test]
fn training_twice_doubles_every_list() {
	let sentences = tokenized(&CORPUS);
	let mut once = NGramModel::new(2).unwrap();
	once.train(&sentences);
	let mut twice = once.clone();
	twice.train(&sentences);

	assert_eq!(once.len(), twice.len());
	assert_eq!(twice.starts().len(), once.starts().len() * 2);
	for (context, followers) in once.transitions() {
		assert_eq!(twice.followers(context).unwrap().len(), followers.len() * 2);
	}
}

#[test]
fn empty_training_is_a_noop() {
	let mut model = NGramModel::new(2).unwrap();
	let nothing: Vec<Vec<String>> = Vec::new();
	model.train(&nothing);
	assert!(model.is_empty());
	assert!(model.starts().is_empty());
}

#[test]
fn untrained_model_fails_with_untrained() {
	let generator = Generator::new(&GeneratorConfig::default()).unwrap();
	let mut input = generator.make_prediction_input();
	assert!(matches!(generator.generate(&input), Err(ModelError::Untrained)));

	input.set_seed("the cat");
	assert!(matches!(generator.generate(&input), Err(ModelError::Untrained)));
}

#[test]
fn third_token_after_seed_is_observed_follower() {
	let generator = cat_generator(false);
	let mut input = generator.make_prediction_input();
	input.set_seed("the cat");
	input.max_length = 10;
	input.count = 200;

	let mut rng = StdRng::seed_from_u64(42);
	for line in generator.generate_with(&input, &mut rng).unwrap() {
		let tokens: Vec<&str> = line.split_whitespace().collect();
		assert!(tokens.len() <= 10);
		assert_eq!(&tokens[..2], ["the", "cat"]);
		assert!(tokens[2] == "sat" || tokens[2] == "ran", "{line}");
	}
}

#[test]
fn unit_temperature_never_leaves_candidate_lists() {
	let generator = cat_generator(false);
	let primary = generator.model().primary();
	let mut input = generator.make_prediction_input();
	input.count = 100;

	let mut rng = StdRng::seed_from_u64(7);
	for line in generator.generate_with(&input, &mut rng).unwrap() {
		let tokens = Tokenizer::Whitespace.tokenize(&line);
		for window in tokens.windows(3) {
			let followers = primary.followers(&window[..2]).unwrap();
			assert!(followers.contains(&window[2]), "{line}");
		}
	}
}

#[test]
fn single_start_and_single_path_is_deterministic() {
	let config = GeneratorConfig { order: 2, backoff: false, tokenizer: Tokenizer::Whitespace, ..GeneratorConfig::default() };
	let mut generator = Generator::new(&config).unwrap();
	generator.train(&["the cat sat down"]);
	let input = generator.make_prediction_input();

	for seed in [0, 1, 2, 99] {
		let mut rng = StdRng::seed_from_u64(seed);
		for line in generator.generate_with(&input, &mut rng).unwrap() {
			assert_eq!(line, "the cat sat down");
		}
	}
}

#[test]
fn unseen_context_falls_through_to_unigrams() {
	let config = GeneratorConfig { order: 3, backoff: true, tokenizer: Tokenizer::Whitespace, ..GeneratorConfig::default() };
	let mut generator = Generator::new(&config).unwrap();
	generator.train(&["x y z w", "p q"]);
	let primary = generator.model().primary();
	assert!(!primary.contains(&key(&["a", "b", "c"])));
	assert!(!generator.model().get(1).unwrap().is_empty());

	let mut input = generator.make_prediction_input();
	input.start_seed = StartSeed::Custom("a b c".to_owned());
	input.max_length = 4;
	let lines = generator.generate(&input).unwrap();
	for line in lines {
		let tokens: Vec<&str> = line.split_whitespace().collect();
		assert_eq!(tokens.len(), 4, "{line}");
		assert!(["y", "z", "w", "q"].contains(&tokens[3]));
	}
}

#[test]
fn saved_generator_reloads_identically() {
	let generator = cat_generator(true);
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("models").join("cats.lgm");

	generator.save(&path).unwrap();
	let loaded = Generator::load(&path, Tokenizer::Whitespace).unwrap();
	assert_eq!(loaded.model(), generator.model());

	let reloaded = MultiGramModel::load(&path).unwrap();
	assert_eq!(reloaded.orders(), vec![1, 2]);
}

#[test]
fn corrupt_files_are_reported() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("junk.lgm");
	std::fs::write(&path, b"definitely not a model").unwrap();
	assert!(matches!(NGramModel::load(&path), Err(ModelError::Corrupt(_))));
	assert!(matches!(Generator::load(&path, Tokenizer::Whitespace), Err(ModelError::Corrupt(_))));
	assert!(matches!(NGramModel::load(dir.path().join("missing.lgm")), Err(ModelError::Io(_))));
}
