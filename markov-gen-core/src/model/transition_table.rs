use std::collections::{HashMap, VecDeque};

use log::{debug, warn};
use rand::Rng;
use rand::seq::IndexedRandom;

use super::state::State;
use super::tokenizer::is_sentence_end;

/// Maps every `order`-token context to the tokens observed after it.
///
/// # Responsibilities
/// - Build the table from a token sequence in a single pass
/// - Answer successor lookups for a context
/// - Pick random contexts (any, sentence-like starts, ending with a token)
/// - Know which contexts can still lead to a `.`, `!` or `?` token
///
/// # Invariants
/// - Every context has exactly `order` tokens
/// - Every stored context has at least one follower
/// - Contexts are kept in first-seen order so that seeded draws are reproducible
/// - Read-only once built
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionTable {
	/// Number of tokens in a context
	order: usize,

	/// States in first-seen order
	states: Vec<State>,

	/// Context -> position in `states`
	index: HashMap<Vec<String>, usize>,

	/// `terminable[i]`: some walk from `states[i]` emits a sentence end
	terminable: Vec<bool>,
}

impl TransitionTable {
	/// Creates an empty table of the given order.
	pub fn empty(order: usize) -> Self {
		Self { order, states: Vec::new(), index: HashMap::new(), terminable: Vec::new() }
	}

	/// Builds the table from a token sequence.
	///
	/// For each window `tokens[i..i + order]` the token `tokens[i + order]`
	/// is appended to that context's followers.
	///
	/// # Notes
	/// - An `order` of 0, or one not smaller than the token count, gives an
	///   empty table: generation over it dead-ends immediately.
	pub fn build<S: AsRef<str>>(tokens: &[S], order: usize) -> Self {
		let mut table = Self::empty(order);
		if order < 1 || order >= tokens.len() {
			warn!(
				"order {} unusable with {} tokens, transition table left empty",
				order,
				tokens.len()
			);
			return table;
		}

		let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_owned()).collect();
		for (window, next) in tokens.windows(order).zip(tokens.iter().skip(order)) {
			let position = match table.index.get(window) {
				Some(position) => *position,
				None => {
					table.states.push(State::new(window));
					table.index.insert(window.to_vec(), table.states.len() - 1);
					table.states.len() - 1
				}
			};
			table.states[position].add_follower(next);
		}
		table.terminable = table.reaches_sentence_end();

		debug!(
			"built transition table: order {}, {} tokens, {} contexts",
			order,
			tokens.len(),
			table.states.len()
		);
		table
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of contexts.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Followers of `context`, or `None` when the context is a dead end.
	pub fn successors(&self, context: &[String]) -> Option<&[String]> {
		self.state(context).map(State::followers)
	}

	/// All contexts, in first-seen order.
	pub fn contexts(&self) -> impl Iterator<Item = &[String]> {
		self.states.iter().map(State::context)
	}

	/// Iterates `(context, followers)` pairs in first-seen order.
	pub fn iter(&self) -> impl Iterator<Item = (&[String], &[String])> {
		self.states.iter().map(|s| (s.context(), s.followers()))
	}

	/// True when `token` is a component of at least one context.
	pub fn contains_token(&self, token: &str) -> bool {
		self.contexts().any(|c| c.iter().any(|t| t == token))
	}

	/// Contexts whose last token is `token`.
	pub fn contexts_ending_with(&self, token: &str) -> Vec<&[String]> {
		self.contexts()
			.filter(|c| c.last().is_some_and(|t| t == token))
			.collect()
	}

	/// Contexts whose first token starts with an uppercase letter,
	/// a rough "looks like the beginning of a sentence" filter.
	pub fn sentence_starts(&self) -> Vec<&[String]> {
		self.contexts()
			.filter(|c| {
				c.first()
					.and_then(|t| t.chars().next())
					.is_some_and(char::is_uppercase)
			})
			.collect()
	}

	/// Returns a random context, or `None` if the table is empty.
	pub fn choose_context<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&[String]> {
		self.states.choose(rng).map(State::context)
	}

	/// Draws the next token after `context`.
	///
	/// Returns `None` if the context is unknown (dead end).
	pub fn predict<R: Rng + ?Sized>(&self, context: &[String], rng: &mut R) -> Option<&str> {
		self.state(context)?.predict(rng)
	}

	/// True when some walk from `context` emits a sentence-ending token.
	///
	/// Unknown contexts never do.
	pub fn can_reach_sentence_end(&self, context: &[String]) -> bool {
		self.index.get(context).is_some_and(|position| self.terminable[*position])
	}

	/// Draws the next token after `context` among the followers that end a
	/// sentence or lead to a context that can still reach one.
	///
	/// Duplicates keep their weight. Returns `None` when no follower
	/// qualifies, so a walk driven by this method never cycles forever in a
	/// part of the table without sentence ends.
	pub fn predict_toward_end<R: Rng + ?Sized>(&self, context: &[String], rng: &mut R) -> Option<&str> {
		let candidates: Vec<&String> = self
			.state(context)?
			.followers()
			.iter()
			.filter(|f| is_sentence_end(f) || self.can_reach_sentence_end(&next_context(context, f)))
			.collect();
		candidates.choose(rng).copied().map(String::as_str)
	}

	fn state(&self, context: &[String]) -> Option<&State> {
		self.index.get(context).map(|position| &self.states[*position])
	}

	/// Breadth-first search backwards from the contexts with a sentence-ending
	/// follower.
	fn reaches_sentence_end(&self) -> Vec<bool> {
		let mut terminable = vec![false; self.states.len()];
		let mut preceding: Vec<Vec<usize>> = vec![Vec::new(); self.states.len()];
		let mut queue = VecDeque::new();

		for (position, state) in self.states.iter().enumerate() {
			for follower in state.followers() {
				if is_sentence_end(follower) {
					if !terminable[position] {
						terminable[position] = true;
						queue.push_back(position);
					}
				} else if let Some(next) = self.index.get(&next_context(state.context(), follower)) {
					preceding[*next].push(position);
				}
			}
		}

		while let Some(position) = queue.pop_front() {
			for previous in std::mem::take(&mut preceding[position]) {
				if !terminable[previous] {
					terminable[previous] = true;
					queue.push_back(previous);
				}
			}
		}

		debug!(
			"{} of {} contexts can reach a sentence end",
			terminable.iter().filter(|t| **t).count(),
			terminable.len()
		);
		terminable
	}
}

/// Window after `follower` is appended to `context`.
fn next_context(context: &[String], follower: &str) -> Vec<String> {
	let mut next = context.iter().skip(1).cloned().collect::<Vec<String>>();
	next.push(follower.to_owned());
	next
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rand::SeedableRng;

	fn strings(tokens: &[&str]) -> Vec<String> {
		tokens.iter().map(|s| s.to_string()).collect()
	}

	fn cat_dog() -> Vec<String> {
		strings(&["The", "cat", "sat", ".", "The", "dog", "ran", "."])
	}

	#[test]
	fn builds_first_order_table() {
		let table = TransitionTable::build(&cat_dog(), 1);
		assert_eq!(table.len(), 6);
		assert_eq!(table.successors(&strings(&["The"])).unwrap(), ["cat", "dog"]);
		assert_eq!(table.successors(&strings(&["cat"])).unwrap(), ["sat"]);
		assert_eq!(table.successors(&strings(&["sat"])).unwrap(), ["."]);
		assert_eq!(table.successors(&strings(&["."])).unwrap(), ["The"]);
		assert_eq!(table.successors(&strings(&["dog"])).unwrap(), ["ran"]);
		assert_eq!(table.successors(&strings(&["ran"])).unwrap(), ["."]);
	}

	#[test]
	fn builds_second_order_table() {
		let table = TransitionTable::build(&cat_dog(), 2);
		assert_eq!(table.successors(&strings(&["The", "cat"])).unwrap(), ["sat"]);
		assert_eq!(table.successors(&strings(&[".", "The"])).unwrap(), ["dog"]);
		// Last window has no follower
		assert!(table.successors(&strings(&["ran", "."])).is_none());
	}

	#[test]
	fn keeps_duplicates() {
		let tokens = strings(&["a", "b", "a", "b", "a", "c"]);
		let table = TransitionTable::build(&tokens, 1);
		assert_eq!(table.successors(&strings(&["a"])).unwrap(), ["b", "b", "c"]);
	}

	#[test]
	fn contexts_in_first_seen_order() {
		let table = TransitionTable::build(&cat_dog(), 1);
		let contexts: Vec<&str> = table.contexts().map(|c| c[0].as_str()).collect();
		assert_eq!(contexts, vec!["The", "cat", "sat", ".", "dog", "ran"]);
	}

	#[test]
	fn degenerate_orders_give_empty_tables() {
		assert!(TransitionTable::build(&cat_dog(), 0).is_empty());
		assert!(TransitionTable::build(&cat_dog(), 8).is_empty());
		assert!(TransitionTable::build(&cat_dog(), 20).is_empty());
		assert!(TransitionTable::build::<String>(&[], 1).is_empty());
		assert_eq!(TransitionTable::build(&cat_dog(), 8).order(), 8);
	}

	#[test]
	fn token_queries() {
		let table = TransitionTable::build(&cat_dog(), 2);
		assert!(table.contains_token("sat"));
		assert!(!table.contains_token("bird"));
		let ending: Vec<&[String]> = table.contexts_ending_with("The");
		assert_eq!(ending, vec![&strings(&[".", "The"])[..]]);
		let starts = table.sentence_starts();
		assert_eq!(starts.len(), 2);
		assert!(starts.iter().all(|c| c[0] == "The"));
	}

	#[test]
	fn unknown_context_is_a_dead_end() {
		let table = TransitionTable::build(&cat_dog(), 1);
		let mut rng = rand::rng();
		assert!(table.predict(&strings(&["bird"]), &mut rng).is_none());
		assert!(table.predict(&strings(&["cat", "sat"]), &mut rng).is_none());
	}

	#[test]
	fn sentence_end_reachability() {
		let tokens = strings(&["x", "y", "x", "The", "cat", "sat", ".", "dog"]);
		let table = TransitionTable::build(&tokens, 1);
		for context in ["x", "y", "The", "cat", "sat"] {
			assert!(table.can_reach_sentence_end(&strings(&[context])), "{context}");
		}
		// After "." only "dog" (no followers) remains
		assert!(!table.can_reach_sentence_end(&strings(&["."])));
		assert!(!table.can_reach_sentence_end(&strings(&["bird"])));

		let cyclic = TransitionTable::build(&strings(&["The", "a", "b", "a", "b"]), 1);
		assert!(cyclic.contexts().all(|c| !cyclic.can_reach_sentence_end(c)));
	}

	#[test]
	fn prediction_toward_end_skips_hopeless_followers() {
		// "a" goes either to "d ." or into the "b"/"c" loop that never ends
		let tokens = strings(&["a", "d", ".", "a", "b", "c", "b", "c"]);
		let table = TransitionTable::build(&tokens, 1);
		assert!(table.can_reach_sentence_end(&strings(&["a"])));
		for seed in 0..20 {
			let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
			assert_eq!(table.predict_toward_end(&strings(&["a"]), &mut rng), Some("d"));
			assert_eq!(table.predict_toward_end(&strings(&["d"]), &mut rng), Some("."));
		}
		let mut rng = rand::rng();
		assert!(!table.can_reach_sentence_end(&strings(&["b"])));
		assert!(table.predict_toward_end(&strings(&["b"]), &mut rng).is_none());
		assert!(table.predict(&strings(&["b"]), &mut rng).is_some());
	}

	fn token_stream() -> impl Strategy<Value = Vec<String>> {
		prop::collection::vec(prop::sample::select(vec!["a", "b", "c", ".", "D"]), 0..60)
			.prop_map(|v| v.into_iter().map(str::to_owned).collect())
	}

	proptest! {
		#[test]
		fn every_context_has_order_tokens(tokens in token_stream(), order in 1usize..5) {
			let table = TransitionTable::build(&tokens, order);
			for context in table.contexts() {
				prop_assert_eq!(context.len(), order);
			}
		}

		#[test]
		fn every_follower_is_observed(tokens in token_stream(), order in 1usize..5) {
			let table = TransitionTable::build(&tokens, order);
			for (context, followers) in table.iter() {
				prop_assert!(!followers.is_empty());
				for follower in followers {
					let observed = (order..tokens.len())
						.any(|i| &tokens[i - order..i] == context && &tokens[i] == follower);
					prop_assert!(observed);
				}
			}
		}

		#[test]
		fn building_twice_is_identical(tokens in token_stream(), order in 1usize..5) {
			prop_assert_eq!(
				TransitionTable::build(&tokens, order),
				TransitionTable::build(&tokens, order)
			);
		}

		#[test]
		fn follower_count_matches_windows(tokens in token_stream(), order in 1usize..5) {
			let table = TransitionTable::build(&tokens, order);
			let total: usize = table.iter().map(|(_, f)| f.len()).sum();
			prop_assert_eq!(total, tokens.len().saturating_sub(order));
		}

		#[test]
		fn sentence_end_contexts_are_terminable(tokens in token_stream(), order in 1usize..5) {
			let table = TransitionTable::build(&tokens, order);
			for (context, followers) in table.iter() {
				if followers.iter().any(|f| is_sentence_end(f)) {
					prop_assert!(table.can_reach_sentence_end(context));
				}
				if !table.can_reach_sentence_end(context) {
					let mut rng = rand::rng();
					prop_assert!(table.predict_toward_end(context, &mut rng).is_none());
				}
			}
		}
	}
}
