//! Top-level module for the Markov sentence generation system.
//!
//! Data flows one way: corpus text → tokens (`tokenizer`) → transition
//! table (`transition_table`) → random walk (`generator`) → generated
//! sentence → optional similarity score (`similarity`). `MarkovModel` ties
//! the steps together for a given corpus and order.

/// Fixed regular-expression tokenizer, in plain and punctuation-aware modes.
pub mod tokenizer;

/// Context → followers mapping built from a token sequence.
pub mod transition_table;

/// One context and its observed followers.
/// This module is not exposed publicly.
mod state;

/// Bounded random walks: simple and seed-aware/extendable policies.
pub mod generator;

/// Parameters of a generation request.
pub mod generation_input;

/// TF-IDF closest-sentence check.
pub mod similarity;

/// Corpus-level facade owning both tables.
pub mod markov_model;
