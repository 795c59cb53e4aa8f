//! Bearer credential capability
//!
//! The current user's access token is carried as an explicit, cloneable
//! capability instead of process-wide state, so the streaming client can be
//! constructed and tested in isolation.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// Shared handle to the current bearer credential.
///
/// Cloning is cheap; all clones observe the same token, so a sign-out through
/// one handle revokes the credential everywhere.
#[derive(Clone, Default)]
pub struct AuthContext {
    token: Arc<RwLock<Option<String>>>,
}

impl AuthContext {
    /// Create a context with no credential
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context pre-loaded with a token
    pub fn with_token(token: impl Into<String>) -> Self {
        let ctx = Self::new();
        ctx.set_token(token);
        ctx
    }

    /// Install or replace the bearer token
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Revoke the credential (sign-out)
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Whether a credential is currently installed
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// The current token, or `Error::Auth` when none is installed
    pub fn bearer(&self) -> Result<String> {
        self.token
            .read()
            .clone()
            .ok_or_else(|| Error::Auth("no access token set".into()))
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token itself
        f.debug_struct("AuthContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
