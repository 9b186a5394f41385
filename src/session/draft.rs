use serde::Serialize;

/// Minimum number of option rows the authoring form keeps.
pub const MIN_OPTIONS: usize = 2;

/// Poll authoring form state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollDraft {
	pub question: String,
	pub options: Vec<String>,
}

impl Default for PollDraft {
	fn default() -> Self {
		Self {
			question: String::new(),
			options: vec![String::new(); MIN_OPTIONS],
		}
	}
}

impl PollDraft {
	pub fn add_option(&mut self) {
		self.options.push(String::new());
	}

	/// Remove the option row at `index`. Refused when only the minimum rows remain.
	pub fn remove_option(&mut self, index: usize) -> bool {
		if self.options.len() <= MIN_OPTIONS || index >= self.options.len() {
			return false;
		}
		self.options.remove(index);
		true
	}

	pub fn update_option(&mut self, index: usize, value: impl Into<String>) -> bool {
		match self.options.get_mut(index) {
			Some(option) => {
				*option = value.into();
				true
			}
			None => false,
		}
	}

	pub fn clear(&mut self) {
		*self = Self::default();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keeps_at_least_two_rows() {
		let mut draft = PollDraft::default();
		assert_eq!(draft.options.len(), 2);
		assert!(!draft.remove_option(0));

		draft.add_option();
		assert!(draft.update_option(2, "third"));
		assert!(draft.remove_option(0));
		assert_eq!(draft.options, vec!["", "third"]);
		assert!(!draft.remove_option(0));
	}

	#[test]
	fn update_out_of_range_is_refused() {
		let mut draft = PollDraft::default();
		assert!(!draft.update_option(5, "x"));
	}
}
