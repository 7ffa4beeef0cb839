//! Property-based tests for the lobby membership rules
//!
//! Increase cases locally with PROPTEST_CASES=512.

mod fixtures;

use domino_lobby::error::LobbyError;
use domino_lobby::types::LobbyMode;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::env;

use fixtures::create_test_system;

fn proptest_config() -> ProptestConfig {
    let cases = env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(64);

    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}

#[derive(Debug, Clone)]
enum Op {
    Join(i64, i64),
    Leave(i64, i64),
    Status,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Small id ranges so duplicates and mismatches actually happen
    prop_oneof![
        4 => (1i64..8, 100i64..103).prop_map(|(user, chat)| Op::Join(user, chat)),
        2 => (1i64..8, 100i64..103).prop_map(|(user, chat)| Op::Leave(user, chat)),
        1 => Just(Op::Status),
    ]
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn distinct_joins_increment_by_one(max_players in 1usize..8) {
        tokio_test::block_on(async {
            let (manager, _) = create_test_system(LobbyMode::Shared, max_players);

            for (i, user_id) in (1..=max_players as i64).enumerate() {
                let snapshot = manager.join(user_id, 100).await.unwrap();
                prop_assert_eq!(snapshot.player_count, i + 1);
                prop_assert!(snapshot.player_count <= max_players);
                prop_assert_eq!(snapshot.is_full, i + 1 == max_players);
            }

            let err = manager.join(max_players as i64 + 1, 100).await.unwrap_err();
            prop_assert_eq!(err, LobbyError::Full { max_players });
            Ok(())
        })?;
    }

    #[test]
    fn mismatched_chat_never_mutates(
        users in prop::collection::btree_set(1i64..1000, 1..4),
        intruder in 1000i64..2000,
        other_chat in 200i64..300,
    ) {
        tokio_test::block_on(async {
            let (manager, _) = create_test_system(LobbyMode::Shared, 4);
            for user_id in &users {
                manager.join(*user_id, 100).await.unwrap();
            }
            let before = manager.status(None).unwrap();

            let err = manager.join(intruder, other_chat).await.unwrap_err();
            let is_mismatch = matches!(err, LobbyError::ChatMismatch { bound: 100, .. });
            prop_assert!(is_mismatch);
            prop_assert_eq!(manager.status(None).unwrap(), before);
            Ok(())
        })?;
    }

    #[test]
    fn duplicate_join_keeps_count(user_id in any::<i64>(), chat_id in any::<i64>()) {
        prop_assume!(user_id != 0 && chat_id != 0);
        tokio_test::block_on(async {
            let (manager, _) = create_test_system(LobbyMode::Shared, 4);
            manager.join(user_id, chat_id).await.unwrap();

            let err = manager.join(user_id, chat_id).await.unwrap_err();
            prop_assert_eq!(err, LobbyError::AlreadyJoined { user_id });
            prop_assert_eq!(manager.status(None).unwrap().player_count, 1);
            Ok(())
        })?;
    }

    #[test]
    fn leave_then_join_succeeds(users in prop::collection::btree_set(1i64..100, 2..4)) {
        tokio_test::block_on(async {
            let (manager, _) = create_test_system(LobbyMode::Shared, 4);
            for user_id in &users {
                manager.join(*user_id, 100).await.unwrap();
            }

            let first = *users.iter().next().unwrap();
            manager.leave(first, 100).await.unwrap();
            let snapshot = manager.join(first, 100).await.unwrap();
            prop_assert!(snapshot.contains(first));
            prop_assert_eq!(snapshot.player_count, users.len());
            Ok(())
        })?;
    }

    #[test]
    fn random_operations_preserve_invariants(
        ops in prop::collection::vec(op_strategy(), 1..60),
        max_players in 1usize..5,
        per_chat in any::<bool>(),
    ) {
        let mode = if per_chat { LobbyMode::PerChat } else { LobbyMode::Shared };

        tokio_test::block_on(async {
            let (manager, _) = create_test_system(mode, max_players);

            for op in ops {
                match op {
                    Op::Join(user_id, chat_id) => {
                        let before = manager.status(Some(chat_id)).unwrap();
                        match manager.join(user_id, chat_id).await {
                            Ok(snapshot) => {
                                prop_assert!(!before.contains(user_id));
                                prop_assert!(snapshot.contains(user_id));
                                prop_assert_eq!(snapshot.chat_id, Some(chat_id));
                            }
                            Err(_) => {
                                prop_assert_eq!(manager.status(Some(chat_id)).unwrap(), before);
                            }
                        }
                    }
                    Op::Leave(user_id, chat_id) => {
                        if let Ok(snapshot) = manager.leave(user_id, chat_id).await {
                            prop_assert!(!snapshot.contains(user_id));
                        }
                    }
                    Op::Status => {
                        let first = manager.status(None).unwrap();
                        prop_assert_eq!(manager.status(None).unwrap(), first);
                    }
                }

                for chat_id in 100i64..103 {
                    let snapshot = manager.status(Some(chat_id)).unwrap();
                    let unique: BTreeSet<_> = snapshot.players.iter().collect();
                    prop_assert!(snapshot.player_count <= max_players);
                    prop_assert_eq!(unique.len(), snapshot.player_count);
                    prop_assert_eq!(snapshot.is_full, snapshot.player_count == max_players);
                }
            }
            Ok(())
        })?;
    }
}
