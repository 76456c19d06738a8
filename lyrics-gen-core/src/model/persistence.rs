use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::error::ModelError;

/// Magic prefix of a serialized `NGramModel`.
pub(crate) const MODEL_MAGIC: &[u8; 4] = b"LGM1";

/// Magic prefix of a serialized `MultiGramModel`.
pub(crate) const MULTI_MAGIC: &[u8; 4] = b"LGS1";

/// Serializes `value` with `postcard`, prefixed by `magic`.
pub(crate) fn encode<T: Serialize>(magic: &[u8; 4], value: &T) -> Result<Vec<u8>, ModelError> {
	let mut bytes = magic.to_vec();
	bytes.extend(postcard::to_stdvec(value)?);
	Ok(bytes)
}

/// Decodes a value written by [`encode`] with the same `magic`.
///
/// # Errors
/// `ModelError::Corrupt` if the magic does not match, the body fails to
/// decode, or unread bytes remain after the body.
pub(crate) fn decode<T: DeserializeOwned>(magic: &[u8; 4], bytes: &[u8]) -> Result<T, ModelError> {
	let body = bytes
		.strip_prefix(magic.as_slice())
		.ok_or_else(|| ModelError::Corrupt("unknown format header".to_owned()))?;

	let (value, rest) = postcard::take_from_bytes::<T>(body)?;
	if !rest.is_empty() {
		return Err(ModelError::Corrupt(format!("{} trailing bytes after model data", rest.len())));
	}
	Ok(value)
}

/// Writes `bytes` to `path` atomically.
///
/// The data is written to a temporary file in the target directory and then
/// renamed over `path`, so a crash never leaves a half-written model.
pub(crate) fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), ModelError> {
	let path = path.as_ref();
	let parent = match path.parent() {
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	};
	fs::create_dir_all(parent)?;

	let mut temp_file = NamedTempFile::new_in(parent)?;
	temp_file.write_all(bytes)?;
	temp_file.flush()?;
	temp_file.persist(path).map_err(|e| ModelError::Io(e.error))?;
	Ok(())
}
