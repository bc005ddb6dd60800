use crate::common::{config, identity, TestProvider};
use artifact_tracker_client::client::TrackerClient;
use artifact_tracker_client::session::store::AuthState;
use artifact_tracker_client::storage::cache::{FileSnapshotCache, SessionSnapshot, SnapshotCache};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn resolved(client: &TrackerClient) -> AuthState {
    tokio::time::timeout(Duration::from_secs(5), client.session().resolved())
        .await
        .expect("session never resolved")
}

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");
    let path_str = path.to_str().unwrap();

    let provider = Arc::new(TestProvider::new());
    let client = TrackerClient::connect_with_file_cache(
        config("http://127.0.0.1:9", path_str),
        provider.clone(),
    )
    .await
    .unwrap();
    client
        .session()
        .sign_up(
            "ada@museum.org",
            "Secret1",
            Some("Ada Lovelace"),
            Some("https://img.example/ada.png"),
        )
        .await
        .unwrap();

    let mut rx = client.session().watch();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.session().is_some_and(|s| s.display_name == "Ada Lovelace")),
    )
    .await
    .unwrap()
    .unwrap();
    drop(rx);
    drop(client);

    let restarted = TrackerClient::connect_with_file_cache(
        config("http://127.0.0.1:9", path_str),
        Arc::new(TestProvider::new()),
    )
    .await
    .unwrap();
    assert_eq!(restarted.session().current_state(), AuthState::Unknown);
    let profile = restarted.session().cached_profile().unwrap();
    assert_eq!(profile.name, "Ada Lovelace");
    assert_eq!(profile.profile_picture, "https://img.example/ada.png");
}

#[tokio::test]
async fn test_sign_out_clears_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let provider = Arc::new(TestProvider::new());
    let client = TrackerClient::connect_with_file_cache(
        config("http://127.0.0.1:9", path.to_str().unwrap()),
        provider.clone(),
    )
    .await
    .unwrap();

    provider.emit(Some(identity("ada@museum.org")));
    resolved(&client).await;
    client.session().sign_out().await.unwrap();

    let mut rx = client.session().watch();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == AuthState::Anonymous))
        .await
        .unwrap()
        .unwrap();

    let snapshot = FileSnapshotCache::new(&path).load().await.unwrap();
    assert_eq!(snapshot, Some(SessionSnapshot::signed_out()));
}

#[tokio::test]
async fn test_late_subscriber_sees_authenticated_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let provider = Arc::new(TestProvider::new());
    let client = TrackerClient::connect_with_file_cache(
        config("http://127.0.0.1:9", path.to_str().unwrap()),
        provider.clone(),
    )
    .await
    .unwrap();
    provider.emit(Some(identity("ada@museum.org")));
    resolved(&client).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = client.session().on_session_change(move |state| {
        sink.lock().unwrap().push(state.is_authenticated());
    });

    assert_eq!(*seen.lock().unwrap(), vec![true]);
}

#[tokio::test]
async fn test_failed_sign_in_leaves_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let provider = Arc::new(TestProvider::new());
    let client = TrackerClient::connect_with_file_cache(
        config("http://127.0.0.1:9", path.to_str().unwrap()),
        provider.clone(),
    )
    .await
    .unwrap();

    let result = client.session().sign_in("ada@museum.org", "wrong").await;

    assert!(result.is_err());
    assert_eq!(client.session().current_state(), AuthState::Unknown);
    assert!(client.session().cached_profile().is_none());
}
