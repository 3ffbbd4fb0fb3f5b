use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::exclusions::Exclusions;

/// Token framing the start and the end of every sequence.
pub const SENTINEL: &str = "";

/// Punctuation marks recognised as standalone tokens.
///
/// The detokenizer dispatches on the same set, so both halves stay in step.
pub const PUNCTUATION: [&str; 8] = [".", ",", "!", "?", "/", ";", "(", ")"];

/// Word runs first, then single punctuation marks, then platform references
/// (custom emoji `<:name:id>` / `<a:name:id>`, channel `<#id>`, mention `<@id>` / `<@!id>`).
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	let punctuation: Vec<String> = PUNCTUATION.iter().map(|p| regex::escape(p)).collect();
	let pattern = format!(r"[\w']+|{}|<a?:\w+:\d+>|<#\d+>|<@!?\d+>", punctuation.join("|"));
	Regex::new(&pattern).expect("token pattern is valid")
});

/// A whitespace-delimited run containing `://`.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S*://\S*").expect("url pattern is valid"));

/// Turns raw message text into a sentinel-framed token sequence.
#[derive(Clone, Debug)]
pub struct Tokenizer {
	max_token_length: usize,
}

impl Tokenizer {
	pub fn new(max_token_length: usize) -> Self {
		Self { max_token_length }
	}

	/// Tokenizes `raw_text`.
	///
	/// Returns `None` when the message must not be ingested: it contains a
	/// blacklisted string, or nothing is left between the sentinels.
	pub fn tokenize(&self, raw_text: &str, exclusions: &Exclusions) -> Option<Vec<String>> {
		let content = normalize(raw_text);

		if exclusions.is_blacklisted(&content) {
			return None;
		}

		let content = exclusions.strip_ignored(&content);
		let content = URL_PATTERN.replace_all(&content, " ");

		let mut tokens = vec![SENTINEL.to_owned()];
		tokens.extend(
			TOKEN_PATTERN
				.find_iter(&content)
				.map(|m| m.as_str())
				.filter(|token| token.chars().count() <= self.max_token_length)
				.map(str::to_owned),
		);
		tokens.push(SENTINEL.to_owned());

		if tokens.len() <= 2 {
			return None;
		}
		Some(tokens)
	}
}

/// NFKC normalization plus the typographic apostrophe folded to `'`,
/// which keeps contractions in one token.
pub fn normalize(raw_text: &str) -> String {
	raw_text.nfkc().map(|c| if c == '\u{2019}' { '\'' } else { c }).collect()
}
