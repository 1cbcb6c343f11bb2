use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A maximal run of word characters or apostrophes, or a single punctuation mark.
static PUNCTUATION_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
	// Constant pattern, cannot fail to compile
	Regex::new(r"[\w']+|[.,!?;:-]").unwrap()
});

/// Marks that close a sentence.
pub const SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// Every single-character token the punctuation-aware tokenizer emits.
pub const PUNCTUATION: [char; 7] = ['.', ',', '!', '?', ';', ':', '-'];

/// How a corpus string is cut into tokens.
///
/// Each mode yields its own transition table.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerMode {
	/// Split on single spaces, punctuation stays glued to words.
	Plain,
	/// Words (with apostrophes) and punctuation marks become separate tokens.
	#[default]
	PunctuationAware,
}

/// Splits `corpus` into tokens according to `mode`.
///
/// Newlines are turned into spaces first. Never fails: an empty input gives
/// an empty sequence in punctuation-aware mode and a single empty token in
/// plain mode, the same as a plain split would.
pub fn tokenize(corpus: &str, mode: TokenizerMode) -> Vec<String> {
	let normalized = corpus.replace('\n', " ");
	match mode {
		TokenizerMode::Plain => normalized.split(' ').map(str::to_owned).collect(),
		TokenizerMode::PunctuationAware => PUNCTUATION_SPLIT
			.find_iter(&normalized)
			.map(|m| m.as_str().to_owned())
			.collect(),
	}
}

/// True when the token's last character closes a sentence.
pub fn is_sentence_end(token: &str) -> bool {
	token.chars().last().is_some_and(|c| SENTENCE_END.contains(&c))
}

/// True when the token is a single punctuation mark.
pub fn is_punctuation(token: &str) -> bool {
	let mut chars = token.chars();
	match (chars.next(), chars.next()) {
		(Some(c), None) => PUNCTUATION.contains(&c),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn punctuation_aware_separates_marks() {
		let tokens = tokenize("The cat sat. Didn't it?", TokenizerMode::PunctuationAware);
		assert_eq!(tokens, vec!["The", "cat", "sat", ".", "Didn't", "it", "?"]);
	}

	#[test]
	fn punctuation_aware_skips_unknown_characters() {
		let tokens = tokenize("  wow (really) -- ok;\tfine", TokenizerMode::PunctuationAware);
		assert_eq!(tokens, vec!["wow", "really", "-", "-", "ok", ";", "fine"]);
	}

	#[test]
	fn plain_keeps_punctuation_glued() {
		let tokens = tokenize("The cat sat.\nThe dog ran!", TokenizerMode::Plain);
		assert_eq!(tokens, vec!["The", "cat", "sat.", "The", "dog", "ran!"]);
	}

	#[test]
	fn plain_keeps_empty_tokens_between_double_spaces() {
		let tokens = tokenize("a  b", TokenizerMode::Plain);
		assert_eq!(tokens, vec!["a", "", "b"]);
	}

	#[test]
	fn empty_input() {
		assert!(tokenize("", TokenizerMode::PunctuationAware).is_empty());
		assert_eq!(tokenize("", TokenizerMode::Plain), vec![""]);
	}

	#[test]
	fn classifies_tokens() {
		assert!(is_sentence_end("."));
		assert!(is_sentence_end("ran!"));
		assert!(!is_sentence_end(","));
		assert!(!is_sentence_end(""));
		assert!(is_punctuation(","));
		assert!(is_punctuation("-"));
		assert!(!is_punctuation("a"));
		assert!(!is_punctuation(".."));
	}
}
