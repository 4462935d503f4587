//! Shared helpers for the web integration tests.

#![allow(dead_code)]

use axum::http::header::{COOKIE, LOCATION};
use axum_test::{TestResponse, TestServer};
use bytes::Bytes;
use std::sync::Arc;
use wasabi_drive::config::Config;
use wasabi_drive::storage::{MemoryObjectStore, ObjectStore, PutBody, SharedStore};
use wasabi_drive::web::handlers::AppState;
use wasabi_drive::web::router::create_router;
use wasabi_drive::{LoginGrant, TokenCipher};

pub const APP_KEY: &str = "test-app-key";
pub const SESSION_SECRET: &str = "test-session-secret";
pub const COOKIE_NAME: &str = "drive_session";
pub const CLIENT_AREA: &str = "Área_do_Cliente";

/// Test configuration over the in-memory backend.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.session.secret = SESSION_SECRET.to_string();
    config.session.app_key = APP_KEY.to_string();
    config.server.max_content_length = 1024 * 1024;
    config
}

/// A test server plus direct handles on its store and state.
pub struct TestDrive {
    pub server: TestServer,
    pub store: Arc<MemoryObjectStore>,
    pub state: Arc<AppState>,
}

impl TestDrive {
    /// Create a test server with an empty store.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a test server with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryObjectStore::new());
        let shared: SharedStore = store.clone();
        let state = Arc::new(AppState::new(shared, &config));
        let router = create_router(state.clone(), config.server.max_content_length);
        let server = TestServer::new(router).expect("Failed to create test server");
        Self {
            server,
            store,
            state,
        }
    }

    /// Encrypted login token for a plaintext grant.
    pub fn token(&self, plaintext: &str) -> String {
        let grant = LoginGrant::parse(plaintext).expect("valid grant");
        TokenCipher::new(APP_KEY).issue(&grant).expect("token")
    }

    /// Log in through `/login/{token}` and return the `Cookie` header value.
    pub async fn login(&self, plaintext: &str) -> String {
        let response = self
            .server
            .get(&format!("/login/{}", self.token(plaintext)))
            .await;
        response.assert_status(axum::http::StatusCode::FOUND);
        let cookie = response.cookie(COOKIE_NAME);
        format!("{}={}", cookie.name(), cookie.value())
    }

    /// Log in as user `ana` of tenant `acme`.
    pub async fn login_acme(&self) -> String {
        self.login("LMDRIVE:acme|Acme Ltda|ana").await
    }

    /// GET with a session cookie.
    pub async fn get(&self, cookie: &str, url: &str) -> TestResponse {
        self.server.get(url).add_header(COOKIE, cookie.to_string()).await
    }

    /// Store an object directly.
    pub async fn put(&self, key: &str, data: &'static [u8]) {
        let body = if data.is_empty() {
            PutBody::Empty
        } else {
            PutBody::Bytes(Bytes::from_static(data))
        };
        self.store.put(key, body).await.expect("put");
    }

    /// Whether a key exists.
    pub async fn exists(&self, key: &str) -> bool {
        self.store.read(key).await.is_some()
    }

    /// Content of a key.
    pub async fn content(&self, key: &str) -> Option<Bytes> {
        self.store.read(key).await
    }

    /// All keys under a prefix.
    pub async fn keys_under(&self, prefix: &str) -> Vec<String> {
        self.store
            .keys()
            .await
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }
}

/// `Location` header of a redirect.
pub fn location(response: &TestResponse) -> String {
    response
        .header(LOCATION)
        .to_str()
        .expect("ascii location")
        .to_string()
}
