//! Integration tests for sign-in, sign-out and startup validation
//!
//! **Coverage:**
//! - Login stores and persists the session; a rejected login never cascades
//! - Logout clears locally even when the server call fails
//! - Startup validation refreshes the principal or signs out
//! - Persisted session survives a restart through the file snapshot

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use questline_domain::LoginRequest;
use questline_infra::api::ApiError;
use questline_infra::session::{CredentialStore, FileSnapshotStore};
use serde_json::json;
use support::{session, Harness};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn credentials() -> LoginRequest {
    LoginRequest { email: "jaina@example.test".to_string(), password: "frostmourne".to_string() }
}

#[tokio::test]
async fn login_stores_and_persists_session() {
    let harness = Harness::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "jaina@example.test", "password": "frostmourne" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": "u-7",
            "email": "jaina@example.test",
            "userName": "Jaina",
            "isAdmin": false,
            "accessToken": "access-7",
            "refreshToken": "refresh-7",
            "accessTokenExpiresAt": "2026-06-01T12:00:00Z"
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let session = harness.auth_service().login(&credentials()).await.unwrap();

    assert_eq!(session.user.user_name, "Jaina");
    assert_eq!(harness.credentials.access_token().as_deref(), Some("access-7"));
    assert!(harness.snapshots.raw().unwrap().contains("refresh-7"));
}

#[tokio::test]
async fn rejected_login_reports_server_message_without_cascade() {
    let harness = Harness::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&harness.server)
        .await;

    let err = harness.auth_service().login(&credentials()).await.unwrap_err();

    assert_eq!(err, ApiError::Http { status: 401, message: "Invalid credentials".to_string() });
    assert_eq!(harness.cascade.runs(), 0);
    assert!(harness.navigator.visits().is_empty());
    assert_eq!(harness.renewal.exchanges(), 0);
}

#[tokio::test]
async fn logout_clears_even_when_server_fails() {
    let harness = Harness::new().await;
    harness.sign_in("access-1", "refresh-1").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer access-1"))
        .and(body_json(json!({ "refreshToken": "refresh-1" })))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&harness.server)
        .await;

    harness.auth_service().logout().await;

    assert!(!harness.credentials.is_authenticated());
    assert!(harness.snapshots.raw().is_none());
}

#[tokio::test]
async fn logout_all_revokes_then_clears() {
    let harness = Harness::new().await;
    harness.sign_in("access-1", "refresh-1").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout-all"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    harness.auth_service().logout_all().await;

    assert!(!harness.credentials.is_authenticated());
}

#[tokio::test]
async fn initiate_refreshes_principal() {
    let harness = Harness::new().await;
    harness.sign_in("access-1", "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": "u-100",
            "email": "khadgar@dalaran.test",
            "userName": "Archmage Khadgar",
            "isAdmin": true
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let user = harness.auth_service().initiate().await.unwrap();

    assert_eq!(user.user_name, "Archmage Khadgar");
    assert_eq!(harness.credentials.user().unwrap().email, "khadgar@dalaran.test");
    assert_eq!(harness.credentials.access_token().as_deref(), Some("access-1"));
}

#[tokio::test]
async fn initiate_signs_out_when_identity_check_fails() {
    let harness = Harness::new().await;
    harness.sign_in("access-1", "refresh-1").await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.server)
        .await;

    assert!(harness.auth_service().initiate().await.is_none());
    assert!(!harness.credentials.is_authenticated());
}

#[tokio::test]
async fn initiate_without_session_makes_no_call() {
    let harness = Harness::new().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    assert!(harness.auth_service().initiate().await.is_none());
}

#[tokio::test]
async fn session_survives_restart_through_file_snapshot() {
    let dir = TempDir::new().unwrap();
    let original = session("access-1", "refresh-1");

    {
        let store = CredentialStore::new(Arc::new(FileSnapshotStore::new(dir.path(), "q.session")));
        store.replace(original.clone()).await.unwrap();
    }

    let restarted = CredentialStore::new(Arc::new(FileSnapshotStore::new(dir.path(), "q.session")));
    assert!(restarted.restore().await);
    assert_eq!(restarted.current(), Some(original));
}

#[tokio::test]
async fn corrupt_file_snapshot_restores_signed_out() {
    let dir = TempDir::new().unwrap();
    let snapshots = FileSnapshotStore::new(dir.path(), "q.session");
    std::fs::write(snapshots.path(), b"\x00\x01 definitely not json").unwrap();

    let store = CredentialStore::new(Arc::new(snapshots.clone()));

    assert!(!store.restore().await);
    assert!(!store.is_authenticated());
    assert!(!snapshots.path().exists());
}
