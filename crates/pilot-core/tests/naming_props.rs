use std::collections::HashSet;

use pilot_core::Agent;
use pilot_core::naming::{
    MAX_SESSION_NAME_LEN, resolve_collision, sanitize_session_name, suggest_session_name,
};
use proptest::prelude::*;

fn allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn any_agent() -> impl Strategy<Value = Agent> {
    prop::sample::select(Agent::ALL.to_vec())
}

proptest! {
    #[test]
    fn suggested_names_are_bounded_and_clean(prompt in ".{0,200}", agent in any_agent()) {
        if let Some(name) = suggest_session_name(&prompt, agent) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().count() <= MAX_SESSION_NAME_LEN);
            prop_assert!(name.chars().all(allowed), "bad char in {name:?}");
            prop_assert!(!name.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn sanitized_overrides_are_bounded_and_clean(raw in "\\PC{0,64}") {
        if let Some(name) = sanitize_session_name(&raw) {
            prop_assert!(name.chars().count() <= MAX_SESSION_NAME_LEN);
            prop_assert!(name.chars().all(allowed));
        }
    }

    #[test]
    fn verb_and_number_prompts(
        verb in prop::sample::select(vec!["fix", "review", "implement", "migrate", "debug"]),
        filler in "[a-z ]{0,30}",
        number in 1u32..1_000_000,
        agent in any_agent(),
    ) {
        let prompt = format!("{verb} {filler} {number}");
        let expected: String = format!("{}-{verb}-{number}", agent.as_str())
            .chars()
            .take(MAX_SESSION_NAME_LEN)
            .collect();
        prop_assert_eq!(suggest_session_name(&prompt, agent), Some(expected));
    }

    #[test]
    fn resolved_names_are_free_and_bounded(
        candidate in "[a-z][a-z0-9-]{0,16}",
        taken_suffixes in prop::collection::vec(2u32..20, 0..10),
    ) {
        let mut taken: HashSet<String> = taken_suffixes
            .iter()
            .map(|n| format!("{candidate}-{n}"))
            .collect();
        taken.insert(candidate.clone());
        let resolved = resolve_collision(&candidate, &taken).expect("space left");
        prop_assert!(!taken.contains(&resolved));
        prop_assert!(resolved.chars().count() <= MAX_SESSION_NAME_LEN);
    }
}
