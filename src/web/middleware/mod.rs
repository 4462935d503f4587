//! Middleware and extractors of the request layer.

pub mod limit;
pub mod security;
pub mod session;

pub use limit::content_length_limit;
pub use security::{no_cache, security_headers};
pub use session::CurrentSession;
