//! Encrypted single-sign-on login tokens.
//!
//! A token is the URL-safe base64 form of `[nonce: 12 bytes][ciphertext][tag]`
//! produced by AES-256-GCM. The key is the SHA-256 digest of the shared
//! application key, so both sides only have to agree on one string.
//!
//! The plaintext is `LMDRIVE:<root>|<title>|<user>[|<internal>[|<external>]]`
//! where the optional flags are `Y` or `N`.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::{DriveError, Result};

/// Marker every login plaintext starts with.
pub const TOKEN_PREFIX: &str = "LMDRIVE:";

/// Nonce size for AES-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Authentication tag size (128 bits).
const TAG_SIZE: usize = 16;

/// Identity carried by a login token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    /// Tenant root inside the bucket.
    pub root: String,
    /// Title shown in the page header.
    pub title: String,
    /// User name, recorded on uploads.
    pub user: String,
    /// Internal (staff) user.
    pub internal: bool,
    /// Whether the user may generate external links.
    pub external_link: bool,
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("y")
}

fn flag(value: bool) -> &'static str {
    if value {
        "Y"
    } else {
        "N"
    }
}

impl LoginGrant {
    /// Parse a decrypted token.
    ///
    /// `internal` defaults to `Y`; `external_link` defaults to `internal`.
    pub fn parse(plaintext: &str) -> Result<Self> {
        let body = plaintext
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| DriveError::Auth("unknown token format".to_string()))?;

        let fields: Vec<&str> = body.split('|').collect();
        if fields.len() < 3 || fields.len() > 5 {
            return Err(DriveError::Auth(format!(
                "expected 3 to 5 token fields, got {}",
                fields.len()
            )));
        }
        if fields[0].trim().is_empty() {
            return Err(DriveError::Auth("token has an empty root".to_string()));
        }

        let internal = fields.get(3).map(|f| parse_flag(f)).unwrap_or(true);
        let external_link = fields.get(4).map(|f| parse_flag(f)).unwrap_or(internal);

        Ok(Self {
            root: fields[0].to_string(),
            title: fields[1].to_string(),
            user: fields[2].to_string(),
            internal,
            external_link,
        })
    }

    /// Plaintext form, the inverse of [`LoginGrant::parse`].
    pub fn format(&self) -> String {
        format!(
            "{TOKEN_PREFIX}{}|{}|{}|{}|{}",
            self.root,
            self.title,
            self.user,
            flag(self.internal),
            flag(self.external_link)
        )
    }

    /// Grant for the client area of this tenant, handed to external users.
    pub fn client_area(&self, client_area: &str) -> Self {
        Self {
            root: format!("{}/{}", self.root.trim_end_matches('/'), client_area),
            title: self.title.clone(),
            user: self.user.clone(),
            internal: false,
            external_link: false,
        }
    }
}

/// Symmetric cipher for login tokens.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Derive the cipher from the shared application key.
    pub fn new(app_key: &str) -> Self {
        let key = Sha256::digest(app_key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    /// Encrypt a plaintext into a URL-safe token.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| DriveError::Auth(format!("token encryption failed: {e}")))?;

        let mut data = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        data.extend_from_slice(&nonce);
        data.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(data))
    }

    /// Decrypt a token back to its plaintext.
    pub fn decrypt(&self, token: &str) -> Result<String> {
        let data = URL_SAFE_NO_PAD
            .decode(token.trim().trim_end_matches('='))
            .map_err(|e| DriveError::Auth(format!("token is not base64: {e}")))?;
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(DriveError::Auth("token too short".to_string()));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| DriveError::Auth("token rejected".to_string()))?;

        String::from_utf8(plaintext).map_err(|_| DriveError::Auth("token is not UTF-8".to_string()))
    }

    /// Mint a login token for a grant.
    pub fn issue(&self, grant: &LoginGrant) -> Result<String> {
        self.encrypt(&grant.format())
    }

    /// Decrypt and parse a login token.
    pub fn verify(&self, token: &str) -> Result<LoginGrant> {
        LoginGrant::parse(&self.decrypt(token)?)
    }
}

impl fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}
