use rand::Rng;
use rand::seq::IndexedRandom;

/// Represents one context of the transition table.
///
/// A `State` holds a fixed-length token window (`context`) and every token
/// observed right after it, in order of appearance. Duplicates are kept:
/// a follower seen three times is three times as likely to be drawn.
///
/// ## Invariants
/// - `context.len()` equals the table order
/// - `followers` is never empty once the state is stored in a table
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct State {
	/// Identifier of the state (the token window).
	context: Vec<String>,
	/// Tokens observed after `context`, duplicates preserved.
	followers: Vec<String>,
}

impl State {
	/// Creates a new state without followers.
	pub(crate) fn new(context: &[String]) -> Self {
		Self {
			context: context.to_vec(),
			followers: Vec::new(),
		}
	}

	pub(crate) fn context(&self) -> &[String] {
		&self.context
	}

	pub(crate) fn followers(&self) -> &[String] {
		&self.followers
	}

	/// Records one occurrence of `next` after this context.
	pub(crate) fn add_follower(&mut self, next: &str) {
		self.followers.push(next.to_owned());
	}

	/// Draws a follower uniformly among the recorded occurrences.
	///
	/// Returns `None` if the state has no followers.
	pub(crate) fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		self.followers.choose(rng).map(String::as_str)
	}
}
