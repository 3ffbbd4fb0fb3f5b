use super::tokenizer::PUNCTUATION;

/// Appends one token to `text` following the punctuation adjacency rules.
///
/// - `/` abuts the previous character and the next token abuts it
/// - `(` is followed directly by the next token
/// - other punctuation abuts the previous character and is followed by a space
/// - anything else is followed by a space
pub fn append_token(text: &mut String, token: &str) {
	match token {
		"/" => {
			trim_separator(text);
			text.push_str(token);
		}
		"(" => text.push_str(token),
		_ if PUNCTUATION.contains(&token) => {
			trim_separator(text);
			text.push_str(token);
			text.push(' ');
		}
		_ => {
			text.push_str(token);
			text.push(' ');
		}
	}
}

/// Reassembles a token sequence (sentinels excluded) into readable text.
pub fn detokenize<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut text = String::new();
	for token in tokens {
		append_token(&mut text, token.as_ref());
	}
	text.truncate(text.trim_end().len());
	text
}

fn trim_separator(text: &mut String) {
	if text.ends_with(' ') {
		text.pop();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn punctuation_abuts_previous_word() {
		assert_eq!(detokenize(&["hello", ",", "world", "!"]), "hello, world!");
	}

	#[test]
	fn slash_joins_both_sides() {
		assert_eq!(detokenize(&["and", "/", "or", "maybe"]), "and/or maybe");
	}

	#[test]
	fn open_paren_hugs_next_token() {
		assert_eq!(detokenize(&["see", "(", "this", ")", "."]), "see (this).");
	}

	#[test]
	fn references_behave_like_words() {
		assert_eq!(detokenize(&["hi", "<@1234>", "<:wave:5>"]), "hi <@1234> <:wave:5>");
	}

	#[test]
	fn leading_punctuation_is_kept() {
		assert_eq!(detokenize(&["(", "."]), "(.");
		assert_eq!(detokenize(&["?", "what"]), "? what");
	}

	#[test]
	fn every_punctuation_mark_has_a_rule() {
		for mark in PUNCTUATION {
			let text = detokenize(&["word", mark]);
			assert!(text.starts_with("word"), "{mark}: {text}");
			assert!(text.contains(mark), "{mark}: {text}");
		}
	}
}
