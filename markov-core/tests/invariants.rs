mod support;

use proptest::prelude::*;

use markov_core::model::exclusions::{ExclusionKind, Exclusions};
use markov_core::Scope;

use support::engine;

fn message_strategy() -> impl Strategy<Value = String> {
	prop::collection::vec(
		prop_oneof![
			"[a-d]{1,3}",
			Just(".".to_owned()),
			Just(",".to_owned()),
			Just("/".to_owned()),
			Just("(".to_owned()),
			Just("<@12>".to_owned()),
			Just("-".to_owned()),
		],
		0..8,
	)
	.prop_map(|words| words.join(" "))
}

proptest! {
	#[test]
	fn totals_match_pair_sums_after_every_ingest(
		messages in prop::collection::vec((message_strategy(), 1u64..3, 1u64..4), 1..25)
	) {
		let engine = engine();
		for (message, community, author) in &messages {
			engine.ingest(message, *community, *author, &Exclusions::default()).unwrap();
			prop_assert!(engine.store().audit().unwrap().is_empty());
		}
	}

	#[test]
	fn tokenize_is_deterministic(text in "\\PC{0,40}", blocked in "[a-z]{0,2}", ignored in "[a-z]{0,2}") {
		let engine = engine();
		let mut exclusions = Exclusions::default();
		let _ = exclusions.list_mut(ExclusionKind::Blacklist).add(&blocked);
		let _ = exclusions.list_mut(ExclusionKind::Ignore).add(&ignored);

		prop_assert_eq!(engine.tokenize(&text, &exclusions), engine.tokenize(&text, &exclusions));
	}

	#[test]
	fn rejected_messages_never_mutate_the_store(text in "[a-z ]{0,30}") {
		let engine = engine();
		let mut exclusions = Exclusions::default();
		exclusions.list_mut(ExclusionKind::Blacklist).add("zz").unwrap();
		let message = format!("{text} zz {text}");

		prop_assert!(!engine.ingest(&message, 1, 1, &exclusions).unwrap());
		prop_assert!(engine.store().scope_is_empty(&Scope::Community(1)).unwrap());
		prop_assert!(engine.store().scope_is_empty(&Scope::Author(1, 1)).unwrap());
	}

	#[test]
	fn generated_walks_end_at_the_sentinel(messages in prop::collection::vec(message_strategy(), 1..10)) {
		let engine = engine();
		let mut any = false;
		for message in &messages {
			any |= engine.ingest(message, 1, 1, &Exclusions::default()).unwrap();
		}
		let result = engine.generate(Scope::Community(1));
		if any {
			prop_assert!(result.is_ok());
		} else {
			prop_assert!(result.is_err());
		}
	}
}
