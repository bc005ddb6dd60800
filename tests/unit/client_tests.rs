use crate::common::{bearer, config, identity, TestProvider};
use artifact_tracker_client::application::models::artifact::{Artifact, ArtifactId, NewArtifact};
use artifact_tracker_client::application::models::catalog::{CatalogQuery, SortOrder};
use artifact_tracker_client::application::services::like_registry::{SyncState, SyncStatus};
use artifact_tracker_client::client::TrackerClient;
use artifact_tracker_client::error::{AppError, AuthError, LikeError};
use artifact_tracker_client::session::store::AuthState;
use artifact_tracker_client::storage::cache::MemorySnapshotCache;
use artifact_tracker_client::utils::logger::setup_logger;
use mockito::{Matcher, Server, ServerGuard};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const ADA: &str = "ada@museum.org";
const BOB: &str = "bob@museum.org";

async fn connect(server: &ServerGuard, provider: Arc<TestProvider>) -> TrackerClient {
    TrackerClient::connect(
        config(&server.url(), "unused.json"),
        provider,
        Arc::new(MemorySnapshotCache::new()),
    )
    .await
    .unwrap()
}

async fn wait_for_sync(client: &TrackerClient, expected: SyncStatus) -> SyncState {
    let mut rx = client.registry().watch_sync();
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.status == expected))
        .await
        .expect("registry did not settle")
        .unwrap()
        .clone();
    state
}

async fn wait_for_auth(client: &TrackerClient, authenticated: bool) -> AuthState {
    let mut rx = client.session().watch();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.is_resolved() && s.is_authenticated() == authenticated),
    )
    .await
    .expect("session did not change")
    .unwrap()
    .clone();
    state
}

fn catalog_body() -> String {
    json!([
        {"_id": "a1", "name": "Rosetta Stone", "type": "Documents", "likes": 5, "adderEmail": ADA},
        {"_id": {"$oid": "a2"}, "name": "Terracotta Army", "type": "Sculptures", "likes": 0, "adderEmail": BOB},
        {"_id": "a3", "name": "Antikythera mechanism", "type": "Tools", "likes": 9}
    ])
    .to_string()
}

#[tokio::test]
async fn test_sign_in_loads_likes_and_toggle_updates_registry() {
    setup_logger();
    let mut server = Server::new_async().await;
    let liked = server
        .mock("GET", "/liked")
        .match_header("authorization", bearer(ADA).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"_id": "a1", "name": "Rosetta Stone"}]"#)
        .expect(1)
        .create_async()
        .await;
    let _artifacts = server
        .mock("GET", "/artifacts")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(catalog_body())
        .create_async()
        .await;
    let toggle = server
        .mock("POST", "/like/a2")
        .match_header("authorization", bearer(ADA).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"liked": true}"#)
        .expect(1)
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider).await;

    client.session().sign_in(ADA, "secret").await.unwrap();
    wait_for_auth(&client, true).await;
    wait_for_sync(&client, SyncStatus::Ready).await;
    assert!(client.is_liked(&ArtifactId::new("a1")));
    assert!(!client.is_liked(&ArtifactId::new("a2")));

    let artifacts = client.list_artifacts().await.unwrap();
    assert_eq!(artifacts.len(), 3);

    let outcome = client.like_toggle(&ArtifactId::new("a2")).await.unwrap();
    assert!(outcome.liked);
    assert_eq!(outcome.like_count, Some(1));
    assert!(client.is_liked(&ArtifactId::new("a2")));
    assert!(client.is_liked(&ArtifactId::new("a1")));
    assert_eq!(client.reconciler().like_count(&ArtifactId::new("a1")), Some(5));

    liked.assert_async().await;
    toggle.assert_async().await;
}

#[tokio::test]
async fn test_user_switch_refetches_for_new_user() {
    let mut server = Server::new_async().await;
    let _ada = server
        .mock("GET", "/liked")
        .match_header("authorization", bearer(ADA).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"_id": "a1"}, {"_id": "a2"}]"#)
        .create_async()
        .await;
    let _bob = server
        .mock("GET", "/liked")
        .match_header("authorization", bearer(BOB).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"_id": "a3"}]"#)
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider.clone()).await;

    provider.emit(Some(identity(ADA)));
    wait_for_sync(&client, SyncStatus::Ready).await;
    assert_eq!(
        client.registry().liked(),
        vec![ArtifactId::new("a1"), ArtifactId::new("a2")]
    );

    client.session().sign_out().await.unwrap();
    wait_for_auth(&client, false).await;
    wait_for_sync(&client, SyncStatus::Idle).await;
    assert!(client.registry().liked().is_empty());
    assert!(!client.is_liked(&ArtifactId::new("a1")));

    client.session().sign_in(BOB, "secret").await.unwrap();
    wait_for_sync(&client, SyncStatus::Ready).await;
    assert_eq!(client.registry().liked(), vec![ArtifactId::new("a3")]);
}

#[tokio::test]
async fn test_toggle_without_session_makes_no_request() {
    let mut server = Server::new_async().await;
    let toggle = server
        .mock("POST", Matcher::Regex(r"^/like/.*$".to_string()))
        .expect(0)
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider.clone()).await;
    provider.emit(None);
    wait_for_auth(&client, false).await;

    let result = client.like_toggle(&ArtifactId::new("a1")).await;
    assert_eq!(result, Err(LikeError::Unauthenticated));
    toggle.assert_async().await;
}

#[tokio::test]
async fn test_rejected_toggle_changes_nothing() {
    let mut server = Server::new_async().await;
    let _liked = server
        .mock("GET", "/liked")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;
    let _artifacts = server
        .mock("GET", "/artifacts")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(catalog_body())
        .create_async()
        .await;
    let _toggle = server
        .mock("POST", "/like/a1")
        .with_status(500)
        .with_body("database unavailable")
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider.clone()).await;
    provider.emit(Some(identity(ADA)));
    wait_for_sync(&client, SyncStatus::Ready).await;
    client.list_artifacts().await.unwrap();

    let result = client.like_toggle(&ArtifactId::new("a1")).await;

    assert_eq!(
        result,
        Err(LikeError::RemoteRejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "database unavailable".to_string()
        })
    );
    assert!(!client.is_liked(&ArtifactId::new("a1")));
    assert_eq!(client.reconciler().like_count(&ArtifactId::new("a1")), Some(5));
}

#[tokio::test]
async fn test_browse_filters_sorts_and_pages() {
    let mut server = Server::new_async().await;
    let _artifacts = server
        .mock("GET", "/artifacts")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(catalog_body())
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider).await;

    let query = CatalogQuery {
        sort: SortOrder::NameAsc,
        page_size: 2,
        page: 2,
        ..CatalogQuery::default()
    };
    let page = client.browse(&query).await.unwrap();

    assert_eq!(page.total_pages, 2);
    assert_eq!(page.total_items, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Terracotta Army");
}

#[tokio::test]
async fn test_add_artifact_validates_before_sending() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/artifacts")
        .expect(0)
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider.clone()).await;
    provider.emit(Some(identity(ADA)));
    wait_for_auth(&client, true).await;

    let draft = NewArtifact {
        name: "Antikythera mechanism".to_string(),
        image: "not a url".to_string(),
        ..NewArtifact::default()
    };
    match client.add_artifact(&draft).await {
        Err(AppError::Validation(errors)) => {
            assert_eq!(errors.get("image"), Some("Please enter a valid image URL."));
            assert!(errors.get("name").is_none());
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    create.assert_async().await;
}

#[tokio::test]
async fn test_only_owner_may_update_or_delete() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("PUT", "/artifacts/a1")
        .match_header("authorization", bearer(ADA).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"modifiedCount": 1}"#)
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/artifacts/a2")
        .expect(0)
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider.clone()).await;
    provider.emit(Some(identity(ADA)));
    wait_for_auth(&client, true).await;

    let artifacts: Vec<Artifact> = serde_json::from_str(&catalog_body()).unwrap();
    let mut own = artifacts[0].clone();
    own.name = "Rosetta Stone (replica)".to_string();
    client.update_artifact(&own).await.unwrap();

    let result = client.delete_artifact(&artifacts[1]).await;
    assert!(matches!(result, Err(AppError::NotOwner)));

    update.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_gated_reads_require_session() {
    let server = Server::new_async().await;
    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider.clone()).await;
    provider.emit(None);
    wait_for_auth(&client, false).await;

    assert!(matches!(
        client.my_artifacts().await,
        Err(AppError::Unauthenticated)
    ));
    assert!(matches!(
        client.liked_artifacts().await,
        Err(AppError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_sign_up_registers_user_with_backend() {
    let mut server = Server::new_async().await;
    let users = server
        .mock("POST", "/api/users")
        .match_body(Matcher::Json(json!({
            "name": "Ada Lovelace",
            "email": ADA,
            "photoURL": "https://img.example/ada.png",
            "password": "Secret1",
            "method": "manual"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"insertedId": "u1"}"#)
        .expect(1)
        .create_async()
        .await;
    let _liked = server
        .mock("GET", "/liked")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider).await;

    let session = client
        .sign_up(
            ADA,
            "Secret1",
            Some("Ada Lovelace"),
            Some("https://img.example/ada.png"),
        )
        .await
        .unwrap();

    assert_eq!(session.display_name, "Ada Lovelace");
    users.assert_async().await;
}

#[tokio::test]
async fn test_weak_password_is_rejected_before_any_request() {
    let mut server = Server::new_async().await;
    let users = server
        .mock("POST", "/api/users")
        .expect(0)
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider).await;

    let result = client.sign_up(ADA, "secret", None, None).await;

    match result {
        Err(AppError::Auth(AuthError::InvalidInput(message))) => {
            assert_eq!(message, "Must include at least one uppercase letter")
        }
        other => panic!("expected invalid input, got {:?}", other),
    }
    assert!(client.current_session().is_none());
    users.assert_async().await;
}

#[tokio::test]
async fn test_federated_sign_in_tolerates_existing_backend_user() {
    let mut server = Server::new_async().await;
    let users = server
        .mock("POST", "/api/users")
        .match_body(Matcher::PartialJson(json!({
            "email": "federated@museum.org",
            "method": "google"
        })))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "User already exists"}"#)
        .expect(1)
        .create_async()
        .await;
    let _liked = server
        .mock("GET", "/liked")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider).await;

    let session = client.sign_in_federated().await.unwrap();

    assert_eq!(session.email, "federated@museum.org");
    users.assert_async().await;
}

#[tokio::test]
async fn test_double_click_sends_one_request() {
    let mut server = Server::new_async().await;
    let _liked = server
        .mock("GET", "/liked")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;
    let toggle = server
        .mock("POST", "/like/a1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"liked": true}"#)
        .expect(1)
        .create_async()
        .await;

    let provider = Arc::new(TestProvider::new());
    let client = connect(&server, provider.clone()).await;
    provider.emit(Some(identity(ADA)));
    wait_for_sync(&client, SyncStatus::Ready).await;

    let target = ArtifactId::new("a1");
    let (first, second) =
        futures_util::future::join(client.like_toggle(&target), client.like_toggle(&target)).await;

    assert!(first.is_ok());
    assert_eq!(second, Err(LikeError::AlreadyInFlight));
    assert!(client.is_liked(&target));
    toggle.assert_async().await;
}
