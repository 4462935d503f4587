//! Authentication module.
//!
//! Users never log in with a password here. An upstream portal hands them
//! an encrypted login token; the token names the tenant root and the user,
//! and a verified token starts a signed cookie session.

mod session;
mod token;

pub use session::{Session, SessionCodec};
pub use token::{LoginGrant, TokenCipher, TOKEN_PREFIX};
