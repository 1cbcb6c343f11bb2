use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::generation_input::{GenerationInput, Policy};
use super::generator::{GeneratedSentence, Generator, StartSeed};
use super::similarity::{SimilarityMatch, most_similar};
use super::tokenizer::{TokenizerMode, tokenize};
use super::transition_table::TransitionTable;
use crate::error::MarkovError;
use crate::io::{corpus_name, read_corpus};

/// Markov text model over a corpus of sentences.
///
/// This struct manages:
/// - `sentences`: the corpus, kept for the similarity check
/// - `plain` and `punctuation`: one transition table per tokenizer mode,
///   both built once from the space-joined corpus
/// - `corpus_names`: names of the corpus files loaded from disk
///
/// Tables are read-only after construction, so a model can be shared by
/// reference between threads.
#[derive(Clone, Debug)]
pub struct MarkovModel {
	sentences: Vec<String>,
	order: usize,
	plain: TransitionTable,
	punctuation: TransitionTable,
	corpus_names: Vec<String>,
}

impl MarkovModel {
	/// Builds a model of the given order from a corpus.
	///
	/// The corpus is joined with spaces (newlines become spaces) and
	/// tokenized in both modes. An `order` the corpus cannot support gives
	/// empty tables, see [`TransitionTable::build`].
	pub fn new(sentences: Vec<String>, order: usize) -> Self {
		let corpus = sentences.join(" ");
		let plain = TransitionTable::build(&tokenize(&corpus, TokenizerMode::Plain), order);
		let punctuation = TransitionTable::build(&tokenize(&corpus, TokenizerMode::PunctuationAware), order);
		info!(
			"built model: {} sentences, order {}, {} plain / {} punctuation-aware contexts",
			sentences.len(),
			order,
			plain.len(),
			punctuation.len()
		);
		Self { sentences, order, plain, punctuation, corpus_names: Vec::new() }
	}

	/// A model without corpus, every walk over it dead-ends immediately.
	pub fn empty(order: usize) -> Self {
		Self::new(Vec::new(), order)
	}

	/// Loads a corpus file (see [`read_corpus`]) and builds a model from it.
	///
	/// The file stem is recorded as the corpus name.
	pub fn from_file<P: AsRef<Path>>(filepath: P, order: usize) -> Result<Self, MarkovError> {
		let mut model = Self::new(read_corpus(&filepath)?, order);
		model.corpus_names.push(corpus_name(&filepath)?);
		Ok(model)
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn sentences(&self) -> &[String] {
		&self.sentences
	}

	pub fn is_empty(&self) -> bool {
		self.sentences.is_empty()
	}

	/// Names of the corpus files this model was built from.
	pub fn corpus_names(&self) -> &[String] {
		&self.corpus_names
	}

	/// Transition table for a tokenizer mode.
	pub fn table(&self, mode: TokenizerMode) -> &TransitionTable {
		match mode {
			TokenizerMode::Plain => &self.plain,
			TokenizerMode::PunctuationAware => &self.punctuation,
		}
	}

	/// Random sentence with no consideration of punctuation or sentence
	/// boundaries, see [`Generator::simple`].
	pub fn simple_sentence<R: Rng + ?Sized>(
		&self,
		max_steps: usize,
		mode: TokenizerMode,
		rng: &mut R,
	) -> GeneratedSentence {
		Generator::new(self.table(mode)).simple(max_steps, rng)
	}

	/// Seed-aware sentence over the punctuation-aware table, optionally
	/// extended to a sentence end, see [`Generator::extendable`].
	pub fn smarter_sentence<R: Rng + ?Sized>(
		&self,
		max_steps: usize,
		seed: &StartSeed,
		extend: bool,
		rng: &mut R,
	) -> Result<GeneratedSentence, MarkovError> {
		Generator::new(&self.punctuation).extendable(max_steps, seed, extend, rng)
	}

	/// Runs the policy described by `input`.
	pub fn generate<R: Rng + ?Sized>(
		&self,
		input: &GenerationInput,
		rng: &mut R,
	) -> Result<GeneratedSentence, MarkovError> {
		match input.policy {
			Policy::Simple => Ok(self.simple_sentence(input.max_steps, input.mode, rng)),
			Policy::Extendable => self.smarter_sentence(input.max_steps, input.start_seed(), input.extend, rng),
		}
	}

	/// Generates `count` sentences in parallel.
	///
	/// # Behavior
	/// - Draws one seed per sentence from `rng` up front; sentence `i` is
	///   always generated with `StdRng::seed_from_u64(seeds[i])`.
	/// - Splits the sentence indices into one range per CPU core (at most
	///   `count` ranges).
	/// - Output depends on `rng` only, not on the number of cores.
	///
	/// # Errors
	/// Returns the first generation error (e.g. an unknown starter).
	pub fn generate_many<R: Rng>(
		&self,
		count: usize,
		input: &GenerationInput,
		rng: &mut R,
	) -> Result<Vec<GeneratedSentence>, MarkovError> {
		if count == 0 {
			return Ok(Vec::new());
		}

		let seeds: Vec<u64> = (0..count).map(|_| rng.random()).collect();
		let workers = num_cpus::get().clamp(1, count);
		let chunk_size = count.div_ceil(workers);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for (worker, chunk) in seeds.chunks(chunk_size).enumerate() {
				let tx = tx.clone();

				scope.spawn(move || {
					let batch: Vec<Result<GeneratedSentence, MarkovError>> = chunk
						.iter()
						.map(|seed| self.generate(input, &mut StdRng::seed_from_u64(*seed)))
						.collect();
					if tx.send((worker, batch)).is_err() {
						warn!("batch worker {} could not deliver its sentences", worker);
					}
				});
			}
		});
		drop(tx);

		let mut batches: Vec<(usize, Vec<Result<GeneratedSentence, MarkovError>>)> = rx.iter().collect();
		batches.sort_by_key(|(worker, _)| *worker);
		batches.into_iter().flat_map(|(_, batch)| batch).collect()
	}

	/// Finds the corpus sentence closest to `generated`, see [`most_similar`].
	pub fn most_similar_sentence(&self, generated: &str) -> Result<SimilarityMatch, MarkovError> {
		most_similar(generated, &self.sentences)
	}

	/// Merges another model into this one.
	///
	/// The corpora are concatenated and both tables rebuilt, so the result is
	/// the same as a model built from the combined corpus.
	///
	/// # Errors
	/// Returns `OrderMismatch` if the two models do not share the same order.
	pub fn merge(&mut self, other: &Self) -> Result<(), MarkovError> {
		if self.order != other.order {
			return Err(MarkovError::OrderMismatch { expected: self.order, found: other.order });
		}

		let mut sentences = std::mem::take(&mut self.sentences);
		sentences.extend(other.sentences.iter().cloned());
		let mut corpus_names = std::mem::take(&mut self.corpus_names);
		corpus_names.extend(other.corpus_names.iter().cloned());

		*self = Self::new(sentences, self.order);
		self.corpus_names = corpus_names;
		Ok(())
	}
}
