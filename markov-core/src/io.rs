use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
/// - Skips blank lines
pub(crate) fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(str::to_owned)
		.collect())
}

/// Builds a sibling path of `input_path` with `extension` appended.
///
/// Example:
/// `data/chain.bin` + `"tmp"` → `data/chain.bin.tmp`
pub(crate) fn sibling_path<P: AsRef<Path>>(input_path: P, extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();
	let file_name = input_path
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	let mut name = file_name.to_os_string();
	name.push(".");
	name.push(extension);
	Ok(input_path.with_file_name(name))
}

/// Writes `bytes` to `path` through a temporary sibling and a rename,
/// so readers see either the old or the new file, never a torn one.
pub(crate) fn write_atomically<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
	let path = path.as_ref();
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent)?;
	}

	let tmp = sibling_path(path, "tmp")?;
	{
		let mut file = File::create(&tmp)?;
		file.write_all(bytes)?;
		file.sync_all()?;
	}
	fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sibling_keeps_original_extension() {
		let path = sibling_path("data/chain.bin", "tmp").unwrap();
		assert_eq!(path, PathBuf::from("data/chain.bin.tmp"));
	}

	#[test]
	fn atomic_write_replaces_file_and_leaves_no_temp() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("chain.bin");
		write_atomically(&path, b"first").unwrap();
		write_atomically(&path, b"second").unwrap();
		assert_eq!(fs::read(&path).unwrap(), b"second");
		assert!(!sibling_path(&path, "tmp").unwrap().exists());
	}

	#[test]
	fn read_lines_skips_blank_lines() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.txt");
		fs::write(&path, "hello there\n\n  \r\nsecond line\r\n").unwrap();
		assert_eq!(read_lines(&path).unwrap(), vec!["hello there", "second line"]);
	}
}
