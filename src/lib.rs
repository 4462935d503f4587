//! Wasabi Drive - a browser drive over S3-compatible object storage.
//!
//! Users arrive through an encrypted single-sign-on link naming a tenant
//! root inside one shared bucket, and browse that root as folders.

pub mod auth;
pub mod config;
pub mod drive;
pub mod error;
pub mod logging;
pub mod preview;
pub mod storage;
pub mod template;
pub mod web;

pub use auth::{LoginGrant, Session, SessionCodec, TokenCipher};
pub use config::Config;
pub use drive::{Drive, RelativePath, TenantRoot};
pub use error::{DriveError, Result};
pub use storage::{MemoryObjectStore, ObjectStore, S3ObjectStore, SharedStore};
pub use web::WebServer;
