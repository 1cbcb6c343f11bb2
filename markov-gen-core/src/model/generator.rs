use std::fmt;

use log::{debug, warn};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::MarkovError;
use crate::model::tokenizer::{is_punctuation, is_sentence_end};
use crate::model::transition_table::TransitionTable;

/// Strategy used to select the starting context of an extendable walk.
///
/// # Variants
/// - `Starter(String)`: pick a context ending with this token; the sentence
///   starts with the token alone.
/// - `SentenceStart`: pick a context whose first token is capitalized; the
///   sentence starts with the whole context.
/// - `Context(Vec<String>)`: continue from this exact context.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StartSeed {
	Starter(String),
	#[default]
	SentenceStart,
	Context(Vec<String>),
}

/// Token sequence produced by one walk.
///
/// `Display` joins tokens with single spaces, punctuation included
/// (`"The cat sat ."`). [`GeneratedSentence::compact`] attaches punctuation
/// to the preceding token instead (`"The cat sat."`).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedSentence {
	tokens: Vec<String>,
}

impl GeneratedSentence {
	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn last_token(&self) -> Option<&str> {
		self.tokens.last().map(String::as_str)
	}

	/// Renders the sentence without a space before punctuation marks.
	pub fn compact(&self) -> String {
		let mut out = String::new();
		for token in &self.tokens {
			if !out.is_empty() && !is_punctuation(token) {
				out.push(' ');
			}
			out.push_str(token);
		}
		out
	}

	/// Renders with the spaced or compact style.
	pub fn render(&self, compact: bool) -> String {
		if compact { self.compact() } else { self.to_string() }
	}
}

impl fmt::Display for GeneratedSentence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.tokens.join(" "))
	}
}

impl From<GeneratedSentence> for String {
	fn from(sentence: GeneratedSentence) -> Self {
		sentence.to_string()
	}
}

/// State of one random walk: the current window and the tokens produced so far.
///
/// A fresh `Walk` is created for every generation call, nothing is shared
/// between calls.
struct Walk<'a> {
	table: &'a TransitionTable,
	context: Vec<String>,
	generated: Vec<String>,
	steps_taken: usize,
}

impl<'a> Walk<'a> {
	fn new(table: &'a TransitionTable, context: &[String], generated: Vec<String>) -> Self {
		Self { table, context: context.to_vec(), generated, steps_taken: 0 }
	}

	/// Performs one transition.
	///
	/// Returns the appended token, or `None` when the current context is a
	/// dead end (in which case nothing changes).
	fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&str> {
		let next = self.table.predict(&self.context, rng)?.to_owned();
		Some(self.push(next))
	}

	/// Like [`Walk::step`], but only through followers that can still reach a
	/// sentence end (see [`TransitionTable::predict_toward_end`]).
	fn step_toward_end<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&str> {
		let next = self.table.predict_toward_end(&self.context, rng)?.to_owned();
		Some(self.push(next))
	}

	fn push(&mut self, next: String) -> &str {
		// Slide the window: drop the oldest token, append the new one
		if !self.context.is_empty() {
			self.context.remove(0);
		}
		self.context.push(next.clone());

		self.generated.push(next);
		self.steps_taken += 1;
		&self.generated[self.generated.len() - 1]
	}

	fn at_sentence_end(&self) -> bool {
		self.generated.last().is_some_and(|t| is_sentence_end(t))
	}

	fn finish(self) -> GeneratedSentence {
		debug!("walk finished after {} steps, {} tokens", self.steps_taken, self.generated.len());
		GeneratedSentence { tokens: self.generated }
	}
}

/// Sentence generator over a single transition table.
///
/// # Responsibilities
/// - Pick a starting context according to the policy
/// - Run a bounded random walk, stopping at dead ends
/// - Optionally extend the walk until a sentence-ending token
///
/// The table is only read, so one table can back any number of generators,
/// including from several threads.
#[derive(Clone, Copy, Debug)]
pub struct Generator<'a> {
	table: &'a TransitionTable,
}

impl<'a> Generator<'a> {
	pub fn new(table: &'a TransitionTable) -> Self {
		Self { table }
	}

	pub fn table(&self) -> &'a TransitionTable {
		self.table
	}

	/// Simple generation: no attention to punctuation or sentence boundaries.
	///
	/// Starts from a uniformly random context, see [`Generator::simple_from`].
	/// An empty table yields an empty sentence.
	pub fn simple<R: Rng + ?Sized>(&self, max_steps: usize, rng: &mut R) -> GeneratedSentence {
		match self.table.choose_context(rng) {
			Some(begin) => self.simple_from(begin, max_steps, rng),
			None => GeneratedSentence::default(),
		}
	}

	/// Simple walk from a given context.
	///
	/// All tokens of `begin` are emitted, then at most `max_steps` transitions
	/// are performed, stopping early at a dead end. With `max_steps = 0` only
	/// `begin` is returned.
	pub fn simple_from<R: Rng + ?Sized>(&self, begin: &[String], max_steps: usize, rng: &mut R) -> GeneratedSentence {
		let mut walk = Walk::new(self.table, begin, begin.to_vec());
		while walk.steps_taken < max_steps {
			if walk.step(rng).is_none() {
				break;
			}
		}
		walk.finish()
	}

	/// Punctuation and seed aware generation.
	///
	/// # Parameters
	/// - `max_steps`: steps are counted from 0 and the walk continues while
	///   the count is `<= max_steps`, so at most `max_steps + 1` transitions.
	/// - `seed`: how the first context is chosen, see [`StartSeed`].
	/// - `extend`: once the bound is passed, keep going until the last token
	///   ends with `.`, `!` or `?`. Extension only follows transitions that
	///   can still reach such a token and stops where none can, so corpora
	///   with cycles and no punctuation terminate.
	///
	/// # Errors
	/// - `StarterNotFound` if a starter token appears in no context.
	/// - `StarterCannotLead` if it appears, but no context ends with it.
	pub fn extendable<R: Rng + ?Sized>(
		&self,
		max_steps: usize,
		seed: &StartSeed,
		extend: bool,
		rng: &mut R,
	) -> Result<GeneratedSentence, MarkovError> {
		let mut walk = match seed {
			StartSeed::Starter(starter) => {
				if !self.table.contains_token(starter) {
					warn!("starter '{}' is not in the corpus", starter);
					return Err(MarkovError::StarterNotFound { starter: starter.clone() });
				}
				let begin = match self.table.contexts_ending_with(starter).choose(rng) {
					Some(context) => *context,
					None => {
						warn!("starter '{}' never ends a context", starter);
						return Err(MarkovError::StarterCannotLead { starter: starter.clone() });
					}
				};
				Walk::new(self.table, begin, vec![starter.clone()])
			}
			StartSeed::SentenceStart => {
				let begin = match self.table.sentence_starts().choose(rng) {
					Some(context) => *context,
					// No capitalized context, any context will do
					None => match self.table.choose_context(rng) {
						Some(context) => context,
						None => return Ok(GeneratedSentence::default()),
					},
				};
				Walk::new(self.table, begin, begin.to_vec())
			}
			StartSeed::Context(context) => Walk::new(self.table, context, context.clone()),
		};

		while walk.steps_taken <= max_steps {
			if walk.step(rng).is_none() {
				return Ok(walk.finish());
			}
		}

		if extend {
			while !walk.at_sentence_end() {
				if walk.step_toward_end(rng).is_none() {
					debug!("no sentence end reachable from {:?}", walk.context);
					break;
				}
			}
		}

		Ok(walk.finish())
	}
}
