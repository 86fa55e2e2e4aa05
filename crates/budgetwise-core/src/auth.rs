//! Session identity and authorization
//!
//! A [`Session`] is resolved once (per request on the server, per process in
//! the CLI) and passed by reference to every store call. Nothing downstream
//! re-derives the admin flag.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Claims carried by an identity token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Out-of-band elevation granting cross-user read access
    #[serde(default)]
    pub admin: bool,
    /// Expiry (seconds since epoch)
    pub exp: usize,
}

/// The resolved caller of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    user_id: Option<String>,
    email: Option<String>,
    is_admin: bool,
}

impl Session {
    /// A session with no identity; every write fails with `AuthenticationRequired`
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            email: None,
            is_admin: false,
        }
    }

    pub fn user(user_id: impl Into<String>, email: Option<String>) -> Self {
        let user_id = user_id.into();
        Self {
            user_id: (!user_id.trim().is_empty()).then_some(user_id),
            email,
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::user(user_id, email)
        }
    }

    pub fn from_claims(claims: IdentityClaims) -> Self {
        if claims.admin {
            Self::admin(claims.sub, claims.email)
        } else {
            Self::user(claims.sub, claims.email)
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// The caller's own user id, or `AuthenticationRequired`
    pub fn require_user(&self) -> Result<&str> {
        self.user_id().ok_or(Error::AuthenticationRequired)
    }

    /// Owner or an identified admin may read a user's namespace
    pub fn can_read(&self, user_id: &str) -> bool {
        self.is_authenticated() && (self.is_admin || self.user_id() == Some(user_id))
    }

    /// Only the owner may write to a user's namespace; admin grants reads only
    pub fn can_write(&self, user_id: &str) -> bool {
        self.user_id() == Some(user_id)
    }

    pub fn require_admin(&self) -> Result<()> {
        self.require_user()?;
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::PermissionDenied(
                "administrator access required".to_string(),
            ))
        }
    }
}
