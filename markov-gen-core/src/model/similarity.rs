//! Closest-sentence lookup over TF-IDF vectors.
//!
//! Meant as a quick overfitting check: with a high order the generator
//! tends to replay corpus sentences verbatim, which shows up here as a
//! score close to 1.0.

use std::collections::HashMap;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MarkovError;

/// Terms are runs of at least two word characters.
static TERM: LazyLock<Regex> = LazyLock::new(|| {
	// Constant pattern, cannot fail to compile
	Regex::new(r"\b\w\w+\b").unwrap()
});

/// Result of a similarity check.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimilarityMatch {
	/// The sentence that was checked.
	pub markov_sentence: String,
	/// The corpus entry with the highest cosine similarity.
	pub closest_sentence: String,
	/// Cosine similarity in `[0, 1]`.
	pub score: f64,
}

type SparseVector = HashMap<String, f64>;

/// Finds the corpus entry closest to `generated`.
///
/// Documents are `generated` followed by every corpus entry with its
/// newlines removed. Each document becomes a TF-IDF vector (lowercased
/// terms, raw counts, smoothed idf `ln((1 + n) / (1 + df)) + 1`, L2
/// normalization); the score of an entry is its cosine similarity with the
/// generated sentence. Ties go to the first entry.
///
/// # Errors
/// Returns `EmptyCorpus` if `corpus` is empty.
pub fn most_similar<S: AsRef<str>>(generated: &str, corpus: &[S]) -> Result<SimilarityMatch, MarkovError> {
	if corpus.is_empty() {
		return Err(MarkovError::EmptyCorpus);
	}

	let documents: Vec<String> = std::iter::once(generated.to_owned())
		.chain(corpus.iter().map(|s| s.as_ref().replace('\n', "")))
		.collect();
	let vectors = tfidf(&documents);

	let query = &vectors[0];
	let mut best_index = 1;
	let mut best_score = f64::NEG_INFINITY;
	for (i, vector) in vectors.iter().enumerate().skip(1) {
		let score = dot(query, vector);
		if score > best_score {
			best_score = score;
			best_index = i;
		}
	}

	debug!("closest corpus entry: #{} with score {:.4}", best_index - 1, best_score);
	Ok(SimilarityMatch {
		markov_sentence: generated.to_owned(),
		closest_sentence: documents[best_index].clone(),
		score: best_score,
	})
}

fn terms(document: &str) -> Vec<String> {
	let lowered = document.to_lowercase();
	TERM.find_iter(&lowered).map(|m| m.as_str().to_owned()).collect()
}

/// One L2-normalized TF-IDF vector per document.
fn tfidf(documents: &[String]) -> Vec<SparseVector> {
	let counts: Vec<SparseVector> = documents
		.iter()
		.map(|doc| {
			let mut tf = SparseVector::new();
			for term in terms(doc) {
				*tf.entry(term).or_insert(0.0) += 1.0;
			}
			tf
		})
		.collect();

	let mut document_frequency: HashMap<&str, usize> = HashMap::new();
	for tf in &counts {
		for term in tf.keys() {
			*document_frequency.entry(term.as_str()).or_insert(0) += 1;
		}
	}

	let n = documents.len() as f64;
	let idf: HashMap<&str, f64> = document_frequency
		.iter()
		.map(|(term, df)| (*term, ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0))
		.collect();

	counts
		.iter()
		.map(|tf| {
			let mut weighted: SparseVector = tf
				.iter()
				.map(|(term, count)| (term.clone(), count * idf[term.as_str()]))
				.collect();
			let norm = weighted.values().map(|w| w * w).sum::<f64>().sqrt();
			if norm > 0.0 {
				weighted.values_mut().for_each(|w| *w /= norm);
			}
			weighted
		})
		.collect()
}

fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
	let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
	small
		.iter()
		.filter_map(|(term, w)| large.get(term).map(|other| w * other))
		.sum()
}
