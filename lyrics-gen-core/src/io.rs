use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a whole text file into a `String`.
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	fs::read_to_string(filename)
}

/// Returns the lowercased extension of a path, if any.
///
/// Examples:
/// - `"./data/Lyrics.TXT"` → `Some("txt")`
/// - `"README"` → `None`
pub(crate) fn extension_of<P: AsRef<Path>>(path: P) -> Option<String> {
	path.as_ref()
		.extension()
		.and_then(OsStr::to_str)
		.map(str::to_lowercase)
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists the files of `dir` whose extension is one of `extensions`.
///
/// Matching is case-insensitive. Subdirectories are ignored. Paths are
/// returned sorted by file name so that corpora are always read in the same
/// order.
pub(crate) fn list_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if !path.is_file() {
			continue;
		}
		if let Some(extension) = extension_of(&path) {
			if extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
				files.push(path);
			}
		}
	}

	files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extension_is_lowercased() {
		assert_eq!(extension_of("data/Lyrics.TXT").as_deref(), Some("txt"));
		assert_eq!(extension_of("README"), None);
	}

	#[test]
	fn lists_matching_files_sorted() {
		let dir = tempfile::tempdir().unwrap();
		for name in ["b.txt", "a.CSV", "c.md", "d.json"] {
			fs::write(dir.path().join(name), "x").unwrap();
		}
		fs::create_dir(dir.path().join("sub.txt")).unwrap();

		let extensions = vec!["txt".to_owned(), "csv".to_owned(), "json".to_owned()];
		let names: Vec<String> = list_files(dir.path(), &extensions)
			.unwrap()
			.iter()
			.map(|p| p.file_name().unwrap().to_string_lossy().to_string())
			.collect();
		assert_eq!(names, vec!["a.CSV", "b.txt", "d.json"]);
	}

	#[test]
	fn dot_is_current_dir() {
		assert_eq!(normalize_folder("./"), env::current_dir().unwrap());
		assert_eq!(normalize_folder("data"), PathBuf::from("data"));
	}
}
