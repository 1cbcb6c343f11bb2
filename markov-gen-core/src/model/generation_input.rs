use serde::{Deserialize, Serialize};

use crate::error::MarkovError;
use crate::model::generator::StartSeed;
use crate::model::tokenizer::TokenizerMode;

/// Which generation policy to run.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
	/// Random start, bounded walk, no attention to punctuation.
	Simple,
	/// Seed-aware start with optional extension to a sentence end.
	#[default]
	Extendable,
}

/// Parameters of one generation request.
///
/// # Responsibilities
/// - Track generation parameters (`max_steps`, `policy`, `mode`, `extend`, `compact`)
/// - Hold the start seed and reject seeds that cannot be used
///
/// # Notes
/// - `mode` only applies to the simple policy; the extendable policy always
///   walks the punctuation-aware table.
/// - `start_seed` and `extend` only apply to the extendable policy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationInput {
	/// Step bound of the walk.
	pub max_steps: usize,

	pub policy: Policy,

	/// Tokenizer mode (selects the table) for the simple policy.
	pub mode: TokenizerMode,

	/// Keep walking past `max_steps` until a sentence-ending token.
	pub extend: bool,

	/// Render without a space before punctuation.
	pub compact: bool,

	/// How the walk starts.
	start_seed: StartSeed,
}

impl Default for GenerationInput {
	fn default() -> Self {
		Self {
			max_steps: 15,
			policy: Policy::default(),
			mode: TokenizerMode::default(),
			extend: false,
			compact: false,
			start_seed: StartSeed::default(),
		}
	}
}

impl GenerationInput {
	/// Returns the current start seed.
	pub fn start_seed(&self) -> &StartSeed {
		&self.start_seed
	}

	/// Sets the start seed.
	///
	/// # Errors
	/// Returns an error for an empty starter token or an empty context.
	pub fn set_start_seed(&mut self, start_seed: StartSeed) -> Result<(), MarkovError> {
		match &start_seed {
			StartSeed::Starter(s) if s.trim().is_empty() => {
				return Err(MarkovError::InvalidInput("starter cannot be empty".to_owned()));
			}
			StartSeed::Context(c) if c.is_empty() => {
				return Err(MarkovError::InvalidInput("context cannot be empty".to_owned()));
			}
			_ => (),
		}
		self.start_seed = start_seed;
		Ok(())
	}

	/// Shorthand for `set_start_seed(StartSeed::Starter(..))`.
	pub fn set_starter(&mut self, starter: &str) -> Result<(), MarkovError> {
		self.set_start_seed(StartSeed::Starter(starter.trim().to_owned()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let input = GenerationInput::default();
		assert_eq!(input.policy, Policy::Extendable);
		assert_eq!(input.mode, TokenizerMode::PunctuationAware);
		assert_eq!(input.start_seed(), &StartSeed::SentenceStart);
		assert!(!input.extend);
	}

	#[test]
	fn rejects_empty_seeds() {
		let mut input = GenerationInput::default();
		assert!(input.set_starter("  ").is_err());
		assert!(input.set_start_seed(StartSeed::Context(Vec::new())).is_err());
		assert_eq!(input.start_seed(), &StartSeed::SentenceStart);
	}

	#[test]
	fn trims_starter() {
		let mut input = GenerationInput::default();
		input.set_starter(" pizza ").unwrap();
		assert_eq!(input.start_seed(), &StartSeed::Starter("pizza".to_owned()));
	}

	#[test]
	fn deserializes_with_missing_fields() {
		let input: GenerationInput =
			serde_json::from_str(r#"{"max_steps": 4, "policy": "simple", "mode": "plain"}"#).unwrap();
		assert_eq!(input.max_steps, 4);
		assert_eq!(input.policy, Policy::Simple);
		assert_eq!(input.mode, TokenizerMode::Plain);
		assert_eq!(input.start_seed(), &StartSeed::SentenceStart);
	}
}
