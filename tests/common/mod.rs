#![allow(dead_code)]

use httpmock::prelude::*;
use serde_json::{json, Value};
use session_relay::model::LoginData;
use session_relay::{ApiClient, CredentialStore, Session, Settings};

pub fn settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.api.base_url = server.base_url();
    settings
}

pub fn logged_in_store(access: &str, refresh: &str) -> CredentialStore {
    let store = CredentialStore::in_memory();
    store
        .save_login_info(LoginData {
            user_id: "u-1".to_string(),
            token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_in: 3600,
            user_info: None,
        })
        .unwrap();
    store
}

pub fn client(server: &MockServer, store: CredentialStore) -> ApiClient {
    let settings = settings(server);
    let session = Session::new(&settings, store).unwrap();
    ApiClient::new(&settings, session).unwrap()
}

pub fn envelope(code: i32, message: &str, data: Value) -> Value {
    json!({ "code": code, "message": message, "data": data })
}

pub fn token_data(token: &str, refresh: &str, expires_in: i64) -> Value {
    envelope(
        200,
        "ok",
        json!({ "token": token, "refreshToken": refresh, "expiresIn": expires_in }),
    )
}
