//! Typed browser session carried in a signed cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::token::LoginGrant;
use crate::config::SessionConfig;
use crate::drive::{SortKey, SortOrder};
use crate::{DriveError, Result};

/// Session state of a logged-in browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Tenant root.
    pub login: String,
    pub title: String,
    pub user: String,
    #[serde(default = "default_true")]
    pub internal: bool,
    #[serde(default = "default_true")]
    pub external_link: bool,
    #[serde(default)]
    pub sort_key: SortKey,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

fn default_true() -> bool {
    true
}

impl Session {
    /// Start a session for a verified login grant.
    pub fn start(grant: LoginGrant, max_age_secs: u64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            login: grant.root,
            title: grant.title,
            user: grant.user,
            internal: grant.internal,
            external_link: grant.external_link,
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            iat: now,
            exp: now.saturating_add(i64::try_from(max_age_secs).unwrap_or(i64::MAX)),
        }
    }

    /// Sort by `column` and flip the direction.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort_key = SortKey::from_column(column);
        self.sort_order = self.sort_order.toggled();
    }

    /// The login grant this session was started from.
    pub fn grant(&self) -> LoginGrant {
        LoginGrant {
            root: self.login.clone(),
            title: self.title.clone(),
            user: self.user.clone(),
            internal: self.internal,
            external_link: self.external_link,
        }
    }
}

/// Signs and verifies session cookies (HS256).
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
    max_age_secs: u64,
}

impl SessionCodec {
    /// Create a codec from the session configuration.
    pub fn new(config: &SessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            cookie_name: config.cookie_name.clone(),
            max_age_secs: config.max_age_secs,
        }
    }

    /// Name of the session cookie.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session lifetime in seconds.
    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    /// Start a session for a grant with the configured lifetime.
    pub fn start(&self, grant: LoginGrant) -> Session {
        Session::start(grant, self.max_age_secs)
    }

    /// Sign a session. Expiry is kept as issued.
    pub fn encode(&self, session: &Session) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), session, &self.encoding_key)
            .map_err(|e| DriveError::Auth(format!("failed to sign session: {e}")))
    }

    /// Verify a signed session. Expired or tampered values are rejected.
    pub fn decode(&self, token: &str) -> Result<Session> {
        decode::<Session>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| DriveError::Auth(format!("invalid session: {e}")))
    }

    /// Session cookie for a response.
    pub fn cookie(&self, session: &Session) -> Result<Cookie<'static>> {
        let value = self.encode(session)?;
        Ok(Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build())
    }

    /// Cookie that clears the session.
    pub fn removal(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), String::new()))
            .path("/")
            .build()
    }

    /// Read the session from request cookies, `None` when absent or invalid.
    pub fn from_jar(&self, jar: &CookieJar) -> Option<Session> {
        let cookie = jar.get(&self.cookie_name)?;
        match self.decode(cookie.value()) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!("Session rejected: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("cookie_name", &self.cookie_name)
            .field("max_age_secs", &self.max_age_secs)
            .finish_non_exhaustive()
    }
}
