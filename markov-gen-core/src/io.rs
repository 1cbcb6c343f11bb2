use std::fs;
use std::path::{Path, PathBuf};
use std::{env, io};

use log::info;
use serde::Deserialize;

use crate::error::MarkovError;

/// File extensions recognised as corpora.
pub const CORPUS_EXTENSIONS: [&str; 3] = ["txt", "json", "jsonl"];

/// One line of a line-delimited JSON review dump. Other fields are ignored.
#[derive(Deserialize)]
struct ReviewRecord {
	text: String,
}

/// Reads a corpus file into one entry per record.
///
/// - `.json` / `.jsonl`: one JSON object per line, the `text` field is kept
/// - anything else: one entry per line
///
/// Blank lines are skipped in both cases.
///
/// # Errors
/// Returns `Io` if the file cannot be read and `Json` for a malformed record.
pub fn read_corpus<P: AsRef<Path>>(filename: P) -> Result<Vec<String>, MarkovError> {
	let path = filename.as_ref();
	let contents = fs::read_to_string(path)?;
	let is_json = matches!(
		path.extension().and_then(|e| e.to_str()),
		Some("json") | Some("jsonl")
	);

	let mut entries = Vec::new();
	for (number, line) in contents.lines().enumerate() {
		if line.trim().is_empty() {
			continue;
		}
		if is_json {
			let record: ReviewRecord = serde_json::from_str(line)
				.map_err(|source| MarkovError::Json { line: number + 1, source })?;
			entries.push(record.text);
		} else {
			entries.push(line.to_owned());
		}
	}

	info!("read {} corpus entries from {}", entries.len(), path.display());
	Ok(entries)
}

/// Name of a corpus: its file stem.
///
/// `data/yelp_reviews.jsonl` and `yelp_reviews.txt` are both named
/// `yelp_reviews`; the server and `MarkovModel::corpus_names` use this name.
pub fn corpus_name<P: AsRef<Path>>(corpus_path: P) -> io::Result<String> {
	match corpus_path.as_ref().file_stem() {
		Some(stem) => Ok(stem.to_string_lossy().into_owned()),
		None => Err(io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no file name")),
	}
}

/// Directory holding the corpus files.
///
/// An empty string, `"."` or `"./"` means the working directory; anything
/// else is taken literally.
pub fn resolve_data_dir(data_dir: &str) -> PathBuf {
	match data_dir.trim() {
		"" | "." | "./" => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
		dir => PathBuf::from(dir),
	}
}

/// Lists all files with one of the given extensions in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		let matches = path
			.extension()
			.and_then(|e| e.to_str())
			.is_some_and(|e| extensions.contains(&e));
		if path.is_file() && matches {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Finds the corpus file named `name` (any corpus extension) in `dir`.
pub fn find_corpus<P: AsRef<Path>>(dir: P, name: &str) -> io::Result<PathBuf> {
	let dir = dir.as_ref();
	for file in list_files(dir, &CORPUS_EXTENSIONS)? {
		if corpus_name(&file)? == name {
			return Ok(dir.join(file));
		}
	}
	Err(io::Error::new(io::ErrorKind::NotFound, format!("No corpus named '{}'", name)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn corpus_name_is_the_file_stem() {
		assert_eq!(corpus_name("./data/yelp_reviews.jsonl").unwrap(), "yelp_reviews");
		assert_eq!(corpus_name("yelp_reviews.txt").unwrap(), "yelp_reviews");
		assert!(corpus_name("/").is_err());
	}

	#[test]
	fn data_dir_defaults_to_working_directory() {
		assert_eq!(resolve_data_dir("./"), env::current_dir().unwrap());
		assert_eq!(resolve_data_dir(""), env::current_dir().unwrap());
		assert_eq!(resolve_data_dir("data"), PathBuf::from("data"));
	}

	#[test]
	fn reads_text_lines() {
		let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
		writeln!(file, "First review.").unwrap();
		writeln!(file).unwrap();
		writeln!(file, "Second one!").unwrap();
		assert_eq!(read_corpus(file.path()).unwrap(), vec!["First review.", "Second one!"]);
	}

	#[test]
	fn reads_review_records() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		writeln!(file, r#"{{"review_id": "r1", "stars": 5, "text": "Great tacos.\nGo there."}}"#).unwrap();
		writeln!(file, r#"{{"review_id": "r2", "stars": 1, "text": "Never again."}}"#).unwrap();
		assert_eq!(
			read_corpus(file.path()).unwrap(),
			vec!["Great tacos.\nGo there.", "Never again."]
		);
	}

	#[test]
	fn malformed_record_reports_line() {
		let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
		writeln!(file, r#"{{"text": "ok"}}"#).unwrap();
		writeln!(file, r#"{{"stars": 3}}"#).unwrap();
		assert!(matches!(read_corpus(file.path()), Err(MarkovError::Json { line: 2, .. })));
	}

	#[test]
	fn lists_and_finds_corpora() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "x").unwrap();
		fs::write(dir.path().join("a.jsonl"), "").unwrap();
		fs::write(dir.path().join("notes.md"), "").unwrap();
		assert_eq!(list_files(dir.path(), &CORPUS_EXTENSIONS).unwrap(), vec!["a.jsonl", "b.txt"]);
		assert_eq!(find_corpus(dir.path(), "b").unwrap(), dir.path().join("b.txt"));
		assert!(find_corpus(dir.path(), "c").is_err());
	}
}
