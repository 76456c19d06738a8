//! Lyrics corpus ingestion.
//!
//! Turns `.txt`, `.csv` and `.json` lyric files (or whole directories of
//! them) into sentence strings ready for training. Reading never fails:
//! an unreadable, unsupported or malformed input is logged and contributes
//! no sentences.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::io::{extension_of, list_files, read_file};

// Static patterns, cannot fail
static SENTENCE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?;\n]").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s']").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// JSON object keys holding lyrics directly.
const DIRECT_KEYS: [&str; 4] = ["lyrics", "lyric", "text", "content"];

/// How raw text is cut into training sentences.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SentenceSplit {
	/// One sentence per non-empty line, punctuation kept.
	#[default]
	Lines,
	/// Split on `. ! ? ;` and line breaks, then strip everything but word
	/// characters, whitespace and apostrophes.
	Punctuation,
}

/// Ingestion settings, passed explicitly to every reader.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CorpusConfig {
	#[serde(default)]
	pub split: SentenceSplit,
	/// Extensions (without dot) considered when reading a directory.
	#[serde(default = "default_extensions")]
	pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
	vec!["txt".to_owned(), "csv".to_owned(), "json".to_owned()]
}

impl Default for CorpusConfig {
	fn default() -> Self {
		Self { split: SentenceSplit::default(), extensions: default_extensions() }
	}
}

/// Reads a file or a directory of files and returns its sentences.
///
/// Directory entries are read in file-name order. Returns an empty vector
/// when nothing usable was found.
pub fn read_corpus<P: AsRef<Path>>(path: P, config: &CorpusConfig) -> Vec<String> {
	let path = path.as_ref();

	if path.is_dir() {
		return list_corpus_files(path, config)
			.iter()
			.flat_map(|file| read_corpus_file(file, config))
			.collect();
	}
	read_corpus_file(path, config)
}

/// Lists the corpus files of a directory, sorted by name.
///
/// Returns an empty vector (and logs a warning) if the directory cannot be
/// read.
pub fn list_corpus_files<P: AsRef<Path>>(dir: P, config: &CorpusConfig) -> Vec<PathBuf> {
	match list_files(&dir, &config.extensions) {
		Ok(files) => files,
		Err(e) => {
			warn!("cannot list corpus directory {}: {}", dir.as_ref().display(), e);
			Vec::new()
		}
	}
}

fn read_corpus_file(path: &Path, config: &CorpusConfig) -> Vec<String> {
	let Some(text) = read_text(path) else {
		return Vec::new();
	};
	let sentences = split_sentences(&text, config.split);
	if sentences.is_empty() {
		warn!("no sentences found in {}", path.display());
	} else {
		debug!("{}: {} sentences extracted", path.display(), sentences.len());
	}
	sentences
}

/// Extracts the lyric text of one file according to its extension.
///
/// Returns `None` if the file is unreadable, malformed or of an
/// unsupported format.
pub fn read_text<P: AsRef<Path>>(path: P) -> Option<String> {
	let path = path.as_ref();
	let extension = extension_of(path).unwrap_or_default();

	let contents = match read_file(path) {
		Ok(contents) => contents,
		Err(e) => {
			warn!("cannot read {}: {}", path.display(), e);
			return None;
		}
	};

	let text = match extension.as_str() {
		"txt" => Ok(contents),
		"csv" => extract_csv(&contents).map_err(|e| e.to_string()),
		"json" => extract_json(&contents).map_err(|e| e.to_string()),
		other => Err(format!("unsupported file format '{}'", other)),
	};

	match text {
		Ok(text) => Some(text),
		Err(e) => {
			warn!("cannot extract lyrics from {}: {}", path.display(), e);
			None
		}
	}
}

/// Cuts raw text into non-empty sentences.
pub fn split_sentences(text: &str, split: SentenceSplit) -> Vec<String> {
	match split {
		SentenceSplit::Lines => text
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.map(str::to_owned)
			.collect(),
		SentenceSplit::Punctuation => SENTENCE_BREAK_RE
			.split(text)
			.map(clean_text)
			.filter(|sentence| !sentence.is_empty())
			.collect(),
	}
}

/// Replaces everything but word characters, whitespace and apostrophes by
/// spaces, collapses whitespace, trims and lowercases.
pub fn clean_text(text: &str) -> String {
	let text = NON_WORD_RE.replace_all(text, " ");
	let text = SPACES_RE.replace_all(&text, " ");
	text.trim().to_lowercase()
}

/// Lyrics of a CSV file: the first column whose header mentions "lyric",
/// else the first column. Rows are joined with line breaks.
fn extract_csv(contents: &str) -> Result<String, csv::Error> {
	let mut reader = csv::ReaderBuilder::new()
		.has_headers(true)
		.flexible(true)
		.from_reader(contents.as_bytes());

	let column = reader
		.headers()?
		.iter()
		.position(|header| header.to_lowercase().contains("lyric"))
		.unwrap_or(0);

	let mut lyrics = Vec::new();
	for record in reader.records() {
		let record = record?;
		if let Some(field) = record.get(column) {
			lyrics.push(field.to_owned());
		}
	}
	Ok(lyrics.join("\n"))
}

/// First string value of `object` whose key mentions "lyric".
fn lyric_field(object: &serde_json::Map<String, Value>) -> Option<&str> {
	object
		.iter()
		.find(|(key, value)| key.to_lowercase().contains("lyric") && value.is_string())
		.and_then(|(_, value)| value.as_str())
}

/// Lyrics of a JSON document.
///
/// - Array of objects: the first `lyric*` string of each object
/// - Object: a direct `lyrics` / `lyric` / `text` / `content` string, else
///   the `lyric*` strings of nested objects and arrays of objects
/// - Anything else: the JSON text itself
fn extract_json(contents: &str) -> Result<String, serde_json::Error> {
	let data: Value = serde_json::from_str(contents)?;
	let mut lyrics: Vec<&str> = Vec::new();

	match &data {
		Value::Array(items) => {
			lyrics.extend(items.iter().filter_map(Value::as_object).filter_map(lyric_field));
		}
		Value::Object(object) => {
			if let Some(text) = DIRECT_KEYS.iter().find_map(|key| object.get(*key).and_then(Value::as_str)) {
				return Ok(text.to_owned());
			}
			for value in object.values() {
				match value {
					Value::Object(nested) => {
						lyrics.extend(
							nested
								.iter()
								.filter(|(key, _)| key.to_lowercase().contains("lyric"))
								.filter_map(|(_, v)| v.as_str()),
						);
					}
					Value::Array(items) if items.first().is_some_and(Value::is_object) => {
						for item in items.iter().filter_map(Value::as_object) {
							lyrics.extend(
								item.iter()
									.filter(|(key, _)| key.to_lowercase().contains("lyric"))
									.filter_map(|(_, v)| v.as_str()),
							);
						}
					}
					_ => (),
				}
			}
		}
		_ => (),
	}

	if lyrics.is_empty() {
		return serde_json::to_string(&data);
	}
	Ok(lyrics.join("\n"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn lines_split_keeps_punctuation() {
		let sentences = split_sentences("Hello, world!\n\n  second line  \n", SentenceSplit::Lines);
		assert_eq!(sentences, vec!["Hello, world!", "second line"]);
	}

	#[test]
	fn punctuation_split_cleans_sentences() {
		let sentences = split_sentences("I can't stop. Oh-oh! Why?; (yeah)", SentenceSplit::Punctuation);
		assert_eq!(sentences, vec!["i can't stop", "oh oh", "why", "yeah"]);
	}

	#[test]
	fn csv_prefers_lyrics_column() {
		let text = extract_csv("track_name,Lyrics\nsong a,first verse\nsong b,second verse\n").unwrap();
		assert_eq!(text, "first verse\nsecond verse");
	}

	#[test]
	fn csv_defaults_to_first_column() {
		let text = extract_csv("words,year\nhello there,1999\n").unwrap();
		assert_eq!(text, "hello there");
	}

	#[test]
	fn json_array_of_objects() {
		let text = extract_json(r#"[{"title": "a", "lyrics": "la la"}, {"song_lyric": "na na"}, 3]"#).unwrap();
		assert_eq!(text, "la la\nna na");
	}

	#[test]
	fn json_direct_and_nested() {
		assert_eq!(extract_json(r#"{"content": "direct"}"#).unwrap(), "direct");
		let nested = r#"{"album": {"lyrics_one": "nested"}, "songs": [{"lyric": "in list"}]}"#;
		assert_eq!(extract_json(nested).unwrap(), "nested\nin list");
	}

	#[test]
	fn json_without_lyrics_falls_back_to_text() {
		assert_eq!(extract_json(r#"{"n": 1}"#).unwrap(), r#"{"n":1}"#);
	}

	#[test]
	fn unreadable_or_unsupported_inputs_yield_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let config = CorpusConfig::default();
		assert!(read_corpus(dir.path().join("missing.txt"), &config).is_empty());

		let pdf = dir.path().join("song.pdf");
		fs::write(&pdf, "not lyrics").unwrap();
		assert!(read_corpus(&pdf, &config).is_empty());

		let broken = dir.path().join("broken.json");
		fs::write(&broken, "{not json").unwrap();
		assert!(read_corpus(&broken, &config).is_empty());
	}

	#[test]
	fn directory_is_read_in_name_order() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "second file").unwrap();
		fs::write(dir.path().join("a.txt"), "first file\nstill first").unwrap();
		fs::write(dir.path().join("c.json"), r#"{"lyrics": "third file"}"#).unwrap();
		fs::write(dir.path().join("notes.md"), "ignored").unwrap();

		let sentences = read_corpus(dir.path(), &CorpusConfig::default());
		assert_eq!(sentences, vec!["first file", "still first", "second file", "third file"]);
	}
}
