//! End-to-end tests for a fully wired `AuthProvider`.
//!
//! The login backend is a real axum server on a random port, the token
//! store is a file in a temp dir, and the identity provider is the
//! in-memory one. Nothing is mocked below the trait seams.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use authlink::prelude::*;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

// =========================================================================
// Test backend
// =========================================================================

/// Serves a login route that accepts one account and counts requests.
async fn serve_backend() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/auth/login",
            post(
                |State(hits): State<Arc<AtomicUsize>>, Json(body): Json<Value>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    if body["email"] == "ada@example.com" && body["password"] == "hunter22" {
                        (StatusCode::OK, Json(json!({ "access_token": "abc" })))
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "message": "Invalid credentials" })),
                        )
                    }
                },
            ),
        )
        .with_state(Arc::clone(&hits));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (format!("http://{addr}"), hits)
}

fn config(backend_url: &str, store_path: &Path) -> AuthConfig {
    AuthConfig {
        backend_url: backend_url.to_string(),
        store_path: Some(store_path.to_path_buf()),
        verification_url: Some("https://app.example.test/welcome".into()),
        ..AuthConfig::default()
    }
}

fn ada() -> UserRecord {
    UserRecord::new("github-ada")
        .with_email("ada@example.com")
        .with_display_name("Ada Lovelace")
}

// =========================================================================
// Backend token flow
// =========================================================================

#[tokio::test]
async fn test_email_sign_in_persists_token_to_file() {
    let (url, hits) = serve_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let provider = AuthProviderBuilder::new()
        .config(config(&url, &path))
        .build(Arc::new(InMemoryIdentityProvider::new()))
        .unwrap();

    provider
        .actions()
        .sign_in_with_email_and_password(SignInCredentials::new("ada@example.com", "hunter22"))
        .await;

    let state = provider.state();
    assert!(state.is_authenticated);
    assert_eq!(state.method, Some(AuthMethod::BackendToken));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        FileStore::new(&path).get("token").unwrap().as_deref(),
        Some("abc")
    );
}

#[tokio::test]
async fn test_token_survives_restart_and_skips_backend() {
    let (url, hits) = serve_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let first = AuthProviderBuilder::new()
            .config(config(&url, &path))
            .build(Arc::new(InMemoryIdentityProvider::new()))
            .unwrap();
        first
            .actions()
            .sign_in_with_email_and_password(SignInCredentials::new("ada@example.com", "hunter22"))
            .await;
    }

    let second = AuthProviderBuilder::new()
        .config(config(&url, &path))
        .build(Arc::new(InMemoryIdentityProvider::new()))
        .unwrap();
    second
        .actions()
        .sign_in_with_email_and_password(SignInCredentials::new("ada@example.com", "hunter22"))
        .await;

    assert_eq!(second.state(), SessionState::backend_token());
    assert_eq!(hits.load(Ordering::SeqCst), 1, "second sign-in must not hit the backend");
}

#[tokio::test]
async fn test_rejected_login_reports_backend_message_inline() {
    let (url, _) = serve_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let provider = AuthProviderBuilder::new()
        .config(config(&url, &dir.path().join("session.json")))
        .build(Arc::new(InMemoryIdentityProvider::new()))
        .unwrap();
    let mut notices = provider.notices();

    provider
        .actions()
        .sign_in_with_email_and_password(SignInCredentials::new("ada@example.com", "wrong"))
        .await;

    assert_eq!(notices.recv().await.unwrap(), Notice::FetchStart);
    let notice = notices.recv().await.unwrap();
    let report = notice.error().expect("an error notice");
    assert_eq!(report.message, "Invalid credentials");
    assert_eq!(report.presentation, Presentation::Inline);
    assert!(!provider.state().is_authenticated);
}

#[tokio::test]
async fn test_logout_removes_token_file_entry() {
    let (url, _) = serve_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let provider = AuthProviderBuilder::new()
        .config(config(&url, &path))
        .build(Arc::new(InMemoryIdentityProvider::new()))
        .unwrap();
    let actions = provider.actions();
    actions
        .sign_in_with_email_and_password(SignInCredentials::new("ada@example.com", "hunter22"))
        .await;

    actions.logout().await;

    assert_eq!(FileStore::new(&path).get("token").unwrap(), None);
    assert_eq!(provider.state(), SessionState::signed_out());
}

// =========================================================================
// Identity provider flow
// =========================================================================

#[tokio::test]
async fn test_popup_sign_in_then_observer_sees_user() {
    let (url, hits) = serve_backend().await;
    let identity = Arc::new(
        InMemoryIdentityProvider::new().with_popup_identity(OAuthProvider::Github, ada()),
    );
    let provider = AuthProviderBuilder::new()
        .config(AuthConfig {
            backend_url: url,
            ..AuthConfig::default()
        })
        .build(identity)
        .unwrap();
    let mut observer = provider.observer();

    provider.actions().sign_in_with_popup("github").await;

    let state = observer.wait_until_loaded().await.unwrap();
    assert_eq!(state.user.user(), Some(&ada()));
    assert_eq!(state.method, Some(AuthMethod::Identity));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sign_up_uses_configured_verification_url() {
    let (url, _) = serve_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let provider = AuthProviderBuilder::new()
        .config(config(&url, &dir.path().join("session.json")))
        .build(Arc::clone(&identity))
        .unwrap();

    provider
        .actions()
        .create_user_with_email_and_password(SignUpCredentials::new(
            "Grace Hopper",
            "grace@example.com",
            "cobol1959",
        ))
        .await;

    let mails = identity.verification_mails();
    assert_eq!(mails.len(), 1);
    assert_eq!(
        mails[0].1.continue_url.as_deref(),
        Some("https://app.example.test/welcome")
    );
    let state = provider.state();
    assert_eq!(
        state.user.user().and_then(|u| u.display_name.as_deref()),
        Some("Grace Hopper")
    );
}

#[tokio::test]
async fn test_custom_store_overrides_store_path() {
    let (url, _) = serve_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = Arc::new(MemoryStore::new());
    let provider = AuthProviderBuilder::new()
        .config(config(&url, &path))
        .store(Arc::clone(&store))
        .build(Arc::new(InMemoryIdentityProvider::new()))
        .unwrap();

    provider
        .actions()
        .sign_in_with_email_and_password(SignInCredentials::new("ada@example.com", "hunter22"))
        .await;

    assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
    assert!(!path.exists());
}
