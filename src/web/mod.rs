//! Web UI of the drive.
//!
//! An axum router over [`AppState`]: token login, folder listing, search,
//! move, rename, create, delete, upload, download and presentation preview.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
