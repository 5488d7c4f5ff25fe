//! Caller identity resolution.
//!
//! # Responsibility
//! - Turn an opaque authorization token into the owning `UserId`.
//!
//! # Invariants
//! - Token contents are never logged.
//! - Any failure is reported as `Unauthorized`; callers cannot distinguish
//!   an unknown token from a malformed one.

use crate::model::habit::UserId;
use log::warn;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BEARER_PREFIX: &str = "Bearer ";

/// Identity lookup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    Unauthorized { reason: &'static str },
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { reason } => write!(f, "unauthorized: {reason}"),
        }
    }
}

impl Error for IdentityError {}

/// External identity provider seam.
pub trait IdentityResolver {
    /// Resolves the subject behind `auth_token`.
    fn resolve_user_id(&self, auth_token: &str) -> Result<UserId, IdentityError>;
}

/// Resolver backed by a fixed token table.
///
/// Accepts raw tokens and `Bearer <token>` authorization header values.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, UserId>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as belonging to `user_id`.
    pub fn with_token(mut self, token: impl Into<String>, user_id: UserId) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve_user_id(&self, auth_token: &str) -> Result<UserId, IdentityError> {
        let trimmed = auth_token.trim();
        let token = trimmed.strip_prefix(BEARER_PREFIX).unwrap_or(trimmed).trim();
        if token.is_empty() {
            warn!("event=identity_resolve module=identity status=error error_code=missing_token");
            return Err(IdentityError::Unauthorized {
                reason: "missing token",
            });
        }

        self.tokens.get(token).cloned().ok_or_else(|| {
            warn!("event=identity_resolve module=identity status=error error_code=unknown_token");
            IdentityError::Unauthorized {
                reason: "unknown or expired token",
            }
        })
    }
}
