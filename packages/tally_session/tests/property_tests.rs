use proptest::prelude::*;
use serde_json::Number;
use std::collections::HashSet;

use tally_session::{ClientMessage, OptionId, Participant, SessionHub, SessionState, VoteOption};

fn arb_option_id() -> impl Strategy<Value = OptionId> {
    prop_oneof![
        (0i64..8).prop_map(OptionId::Index),
        (0u32..8).prop_map(|n| OptionId::from(Number::from_f64(f64::from(n) + 0.5).unwrap())),
        "[a-z]{1,4}".prop_map(OptionId::Text),
    ]
}

fn arb_voter() -> impl Strategy<Value = String> {
    prop_oneof![Just("u1"), Just("u2"), Just("u3"), Just("u4")].prop_map(String::from)
}

fn arb_option() -> impl Strategy<Value = VoteOption> {
    "[A-Za-z]{1,8}".prop_map(VoteOption::labeled)
}

// --- Vote invariants ---

proptest! {
    #[test]
    fn only_first_vote_counts(
        votes in prop::collection::vec((arb_voter(), arb_option_id()), 0..64),
    ) {
        let mut state = SessionState::new();
        let mut first = std::collections::HashMap::new();
        let mut previous_total = 0;

        for (voter, option_id) in votes {
            let applied = state.cast_vote(&voter, option_id.clone()).is_applied();
            prop_assert_eq!(applied, !first.contains_key(&voter));
            first.entry(voter).or_insert(option_id);

            let total = state.total_votes();
            prop_assert!(total >= previous_total);
            prop_assert!(total <= previous_total + 1);
            previous_total = total;
        }

        prop_assert_eq!(state.total_votes(), first.len());
        for (voter, option_id) in &first {
            prop_assert_eq!(state.vote_of(voter), Some(option_id));
        }
    }

    #[test]
    fn option_order_is_last_write(
        appended in prop::collection::vec(arb_option(), 0..16),
        replacement in prop::option::of(prop::collection::vec(arb_option(), 0..16)),
        tail in prop::collection::vec(arb_option(), 0..4),
    ) {
        let mut state = SessionState::new();
        for option in &appended {
            state.add_option(option.clone());
        }
        prop_assert_eq!(state.options(), appended.as_slice());

        let mut expected = match replacement {
            Some(replacement) => {
                state.reorder_options(replacement.clone());
                replacement
            }
            None => appended,
        };
        for option in &tail {
            state.add_option(option.clone());
            expected.push(option.clone());
        }
        prop_assert_eq!(state.snapshot(0).options, expected);
    }
}

// --- Hub broadcast accounting ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn one_broadcast_per_state_change(
        votes in prop::collection::vec((arb_voter(), arb_option_id()), 1..32),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let hub = SessionHub::new();
            let (watcher, mut rx) = Participant::channel("watcher", 256);
            hub.join(watcher).await;
            let _ = rx.try_recv();

            let mut voted = HashSet::new();
            for (voter, option_id) in votes {
                let outcome = hub
                    .handle_message(&voter, ClientMessage::Vote { option_id })
                    .await;
                let fresh = voted.insert(voter);
                prop_assert_eq!(outcome.changed_state(), fresh);

                let frames = std::iter::from_fn(|| rx.try_recv().ok()).count();
                prop_assert_eq!(frames, usize::from(fresh));
            }
            prop_assert_eq!(hub.snapshot().await.total_votes, voted.len());
            Ok(())
        })?;
    }
}
