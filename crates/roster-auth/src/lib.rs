//! Operator authentication for the roster portal
//!
//! Password hashing (Argon2id) and signed session tokens (HS256 JWT).

pub mod password;
pub mod session;

pub use password::{hash_password, validate_password_strength, verify_password, PasswordError};
pub use session::{SessionClaims, SessionError, SessionSigner, SESSION_TOKEN_TYPE};
