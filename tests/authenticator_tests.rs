mod common;

use httpmock::prelude::*;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use session_relay::service::RefreshOutcome;
use session_relay::{CredentialStore, Session, Settings};
use std::time::Duration;

#[tokio::test]
async fn test_http_unauthorized_refreshes_with_retry_count() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method(GET)
            .path("/profile")
            .header("authorization", "Bearer at-old");
        then.status(401).body("unauthorized");
    });
    let refresh = server.mock(|when, then| {
        when.method(POST)
            .path("/auth/refresh")
            .json_body(json!({ "refreshToken": "rt-abc" }));
        then.status(200).json_body(common::token_data("at-new", "rt-new", 3600));
    });
    let retried = server.mock(|when, then| {
        when.method(GET)
            .path("/profile")
            .header("authorization", "Bearer at-new")
            .header("retry-count", "1");
        then.status(200)
            .json_body(common::envelope(200, "ok", json!({ "userName": "alice" })));
    });

    let client = common::client(&server, common::logged_in_store("at-old", "rt-abc"));
    let response = client.get("/profile").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(rejected.calls(), 1);
    assert_eq!(refresh.calls(), 1);
    assert_eq!(retried.calls(), 1);
    assert_eq!(
        client.session().store().tokens(),
        (Some("at-new".to_string()), Some("rt-new".to_string()))
    );
}

#[tokio::test]
async fn test_retry_count_ceiling_skips_refresh() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method(GET).path("/profile");
        then.status(401).body("unauthorized");
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/auth/refresh");
        then.status(200).json_body(common::token_data("at-new", "rt-new", 3600));
    });

    let client = common::client(&server, common::logged_in_store("at-old", "rt-abc"));
    let builder = client
        .request(Method::GET, "/profile")
        .unwrap()
        .header("Retry-Count", "1");
    let response = client.send(builder).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.text(), "unauthorized");
    assert_eq!(rejected.calls(), 1);
    assert_eq!(refresh.calls(), 0);
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn test_repeated_http_unauthorized_surfaces_after_one_retry() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method(GET).path("/profile");
        then.status(401).body("unauthorized");
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/auth/refresh");
        then.status(200).json_body(common::token_data("at-new", "rt-new", 3600));
    });

    let client = common::client(&server, common::logged_in_store("at-old", "rt-abc"));
    let response = client.get("/profile").await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.calls(), 2);
    assert_eq!(refresh.calls(), 1);
}

#[tokio::test]
async fn test_failed_refresh_surfaces_unauthorized_and_logs_out() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/profile");
        then.status(401).body("unauthorized");
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/auth/refresh");
        then.status(401).body("refresh token revoked");
    });

    let client = common::client(&server, common::logged_in_store("at-old", "rt-abc"));
    let response = client.get("/profile").await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(refresh.calls(), 1);
    assert!(!client.is_logged_in());

    // 会话清除后后续请求不再附加令牌
    let anonymous = server.mock(|when, then| {
        when.method(GET).path("/public").header_missing("authorization");
        then.status(200).json_body(common::envelope(200, "ok", Value::Null));
    });
    client.get("/public").await.unwrap();
    assert_eq!(anonymous.calls(), 1);
}

#[tokio::test]
async fn test_missing_refresh_token_gives_up_without_network_call() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/profile");
        then.status(401).body("unauthorized");
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/auth/refresh");
        then.status(200).json_body(common::token_data("at-new", "rt-new", 3600));
    });

    let client = common::client(&server, common::logged_in_store("at-old", ""));
    let response = client.get("/profile").await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(refresh.calls(), 0);
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_refresher_reuses_token_only_for_retired_token() {
    let server = MockServer::start();
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/auth/refresh");
        then.status(200).json_body(common::token_data("at-new", "rt-new", 3600));
    });

    let settings = common::settings(&server);
    let session = Session::new(&settings, common::logged_in_store("at-old", "rt-abc")).unwrap();

    let first = session.refresher().refresh(Some("at-old")).await;
    assert_eq!(first, RefreshOutcome::Refreshed("at-new".to_string()));
    assert_eq!(refresh.calls(), 1);

    // 迟到的请求仍带着被替换的旧令牌，直接复用
    let late = session.refresher().refresh(Some("at-old")).await;
    assert_eq!(late, RefreshOutcome::Refreshed("at-new".to_string()));
    assert_eq!(refresh.calls(), 1);

    // 不是本存储签发过的令牌，必须真正刷新
    let foreign = session.refresher().refresh(Some("someone-else")).await;
    assert_eq!(foreign, RefreshOutcome::Refreshed("at-new".to_string()));
    assert_eq!(refresh.calls(), 2);

    let anonymous = session.refresher().refresh(None).await;
    assert_eq!(anonymous, RefreshOutcome::Refreshed("at-new".to_string()));
    assert_eq!(refresh.calls(), 3);
}

#[tokio::test]
async fn test_refresher_logs_out_without_refresh_token() {
    let settings = Settings::default();
    let session = Session::new(&settings, CredentialStore::in_memory()).unwrap();

    let outcome = session.refresher().refresh(None).await;

    assert_eq!(outcome, RefreshOutcome::LoggedOut);
    assert!(!session.store().is_logged_in());
}

#[tokio::test]
async fn test_login_saves_session_and_logout_clears_it() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/auth/login")
            .header_missing("authorization")
            .json_body(json!({ "username": "alice", "password": "secret" }));
        then.status(200).json_body(common::envelope(
            200,
            "ok",
            json!({
                "userId": "u-42",
                "token": "at-1",
                "refreshToken": "rt-1",
                "expiresIn": 7200,
                "userInfo": { "userName": "alice", "nickname": "Alice" }
            }),
        ));
    });

    let client = common::client(&server, CredentialStore::in_memory());
    let user = client.login("alice", "secret").await.unwrap().unwrap();

    assert_eq!(login.calls(), 1);
    assert_eq!(user.nickname, "Alice");
    assert!(client.is_logged_in());
    assert_eq!(client.session().store().get_user_id().as_deref(), Some("u-42"));

    client.logout().unwrap();
    client.logout().unwrap();
    assert!(!client.is_logged_in());
    assert!(client.current_user().is_none());
}

#[tokio::test]
async fn test_login_rejected_by_server() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/auth/login");
        then.status(200)
            .json_body(common::envelope(1001, "wrong password", Value::Null));
    });

    let client = common::client(&server, CredentialStore::in_memory());
    let err = client.login("alice", "nope").await.unwrap_err();

    assert!(matches!(err, session_relay::AppError::Api { code: 1001, .. }));
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_concurrent_http_unauthorized_share_one_refresh() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/profile")
            .header("authorization", "Bearer at-old");
        then.status(401).body("unauthorized");
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/auth/refresh");
        then.status(200)
            .delay(Duration::from_millis(300))
            .json_body(common::token_data("at-new", "rt-new", 3600));
    });
    let retried = server.mock(|when, then| {
        when.method(GET)
            .path("/profile")
            .header("authorization", "Bearer at-new")
            .header("retry-count", "1");
        then.status(200).json_body(common::envelope(200, "ok", Value::Null));
    });

    let client = common::client(&server, common::logged_in_store("at-old", "rt-abc"));
    let requests = (0..6).map(|_| client.get("/profile"));
    let responses = futures::future::join_all(requests).await;

    for response in responses {
        assert_eq!(response.unwrap().status(), StatusCode::OK);
    }
    assert_eq!(refresh.calls(), 1);
    assert_eq!(retried.calls(), 6);
    assert!(client.is_logged_in());
}
