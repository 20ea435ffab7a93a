use crate::error::AppError;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::RwLock;

/// Operator credentials the console accepts, sourced from config.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self { username: "admin".to_string(), password: "admin123".to_string() }
    }
}

/// Explicit session state: anonymous until a login succeeds, anonymous again
/// after logout. One live bearer token per successful login; no process-wide
/// mutable flag anywhere.
pub struct SessionManager {
    credentials: Credentials,
    tokens: RwLock<HashSet<String>>,
}

impl SessionManager {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials, tokens: RwLock::new(HashSet::new()) }
    }

    /// Plain credential comparison, the only authentication this tool models.
    /// Returns the bearer token proving the session.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        if username != self.credentials.username || password != self.credentials.password {
            return Err(AppError::Unauthorized("invalid username or password".to_string()));
        }
        let token = format!("{:032x}", rand::random::<u128>());
        self.tokens.write()?.insert(token.clone());
        Ok(token)
    }

    /// Forgets the token; unknown tokens are a no-op.
    pub fn logout(&self, token: &str) -> Result<(), AppError> {
        self.tokens.write()?.remove(token);
        Ok(())
    }

    pub fn is_authenticated(&self, token: &str) -> bool {
        self.tokens.read().map(|tokens| tokens.contains(token)).unwrap_or(false)
    }
}
