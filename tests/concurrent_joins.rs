//! Concurrency tests for the lobby manager under a multi-threaded runtime

mod fixtures;

use domino_lobby::error::LobbyError;
use domino_lobby::types::LobbyMode;
use std::time::Instant;

use fixtures::create_test_system;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_never_exceed_capacity() {
    let (manager, events) = create_test_system(LobbyMode::Shared, 4);
    let concurrent_requests = 100;

    let start_time = Instant::now();

    let handles: Vec<_> = (1..=concurrent_requests)
        .map(|user_id| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.join(user_id, 100).await })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let duration = start_time.elapsed();

    let mut successful = 0;
    let mut full = 0;
    for result in results {
        match result.expect("join task panicked") {
            Ok(snapshot) => {
                assert!(snapshot.player_count <= 4);
                successful += 1;
            }
            Err(LobbyError::Full { .. }) | Err(LobbyError::InProgress { .. }) => full += 1,
            Err(e) => panic!("unexpected join error: {}", e),
        }
    }

    println!(
        "{} concurrent joins in {:?}: {} accepted, {} rejected",
        concurrent_requests, duration, successful, full
    );

    assert_eq!(successful, 4);
    assert_eq!(full, concurrent_requests as usize - 4);

    let snapshot = manager.status(None).unwrap();
    assert_eq!(snapshot.player_count, 4);
    assert!(snapshot.is_full);
    assert_eq!(events.count_events_of_type("GameStarting"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_joins_admit_once() {
    let (manager, _) = create_test_system(LobbyMode::Shared, 4);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.join(42, 100).await })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let accepted = results
        .into_iter()
        .filter(|result| matches!(result, Ok(Ok(_))))
        .count();

    assert_eq!(accepted, 1);
    assert_eq!(manager.status(None).unwrap().players, vec![42]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_per_chat_lobbies() {
    let (manager, _) = create_test_system(LobbyMode::PerChat, 4);

    let handles: Vec<_> = (0..10i64)
        .flat_map(|chat| (0..6i64).map(move |seat| (chat, chat * 100 + seat)))
        .map(|(chat_id, user_id)| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.join(user_id, chat_id + 1).await })
        })
        .collect();

    futures::future::join_all(handles).await;

    for chat_id in 1..=10 {
        let snapshot = manager.status(Some(chat_id)).unwrap();
        assert_eq!(snapshot.player_count, 4, "chat {}", chat_id);
        assert_eq!(snapshot.chat_id, Some(chat_id));
    }

    let stats = manager.get_stats().await.unwrap();
    assert_eq!(stats.active_lobbies, 10);
    assert_eq!(stats.games_started, 10);
}
