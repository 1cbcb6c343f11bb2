use thiserror::Error;

/// Failures surfaced by the Markov generation core.
///
/// Dead ends and degenerate orders are not errors: a walk that reaches a
/// context without successor simply stops, and an unusable order yields an
/// empty transition table.
#[derive(Error, Debug)]
pub enum MarkovError {
	/// The requested starter token is not a component of any context.
	#[error("word not in corpus: '{starter}'")]
	StarterNotFound { starter: String },

	/// The starter exists in the corpus but no context ends with it,
	/// so there is nothing to continue from.
	#[error("no context ends with '{starter}'")]
	StarterCannotLead { starter: String },

	#[error("corpus is empty")]
	EmptyCorpus,

	#[error("order mismatch: expected {expected}, found {found}")]
	OrderMismatch { expected: usize, found: usize },

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("malformed JSON record on line {line}: {source}")]
	Json {
		line: usize,
		#[source]
		source: serde_json::Error,
	},
}
