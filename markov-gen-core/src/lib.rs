//! Markov-chain sentence generation library.
//!
//! This crate provides:
//! - A fixed tokenizer (plain split or punctuation-aware)
//! - Word-level n-gram transition tables of any order
//! - Random-walk sentence generation with a seedable RNG
//! - A TF-IDF check of how close a generated sentence is to the corpus
//! - A small corpus loader for text and JSON-lines review dumps
//!
//! ```
//! use markov_gen_core::model::generator::StartSeed;
//! use markov_gen_core::model::markov_model::MarkovModel;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let model = MarkovModel::new(vec!["The cat sat. The dog ran.".to_owned()], 1);
//! let mut rng = StdRng::seed_from_u64(7);
//! let sentence = model.smarter_sentence(3, &StartSeed::SentenceStart, true, &mut rng).unwrap();
//! assert_eq!(sentence.tokens()[0], "The");
//! ```

/// Markov models and generation logic.
pub mod model;

/// Error type shared by the crate.
pub mod error;

/// Corpus loading and path helpers.
pub mod io;

pub use error::MarkovError;
