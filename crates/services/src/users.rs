//! # User Service
//!
//! Admin signup, signin and bearer-token authentication.

use std::sync::Arc;

use domains::{
    AppError, CredentialHasher, NewUser, PublicUser, Result, TokenIssuer, UserRepository,
};

/// A user together with a freshly issued bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Field shape (name length, email syntax) is checked by the caller.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let name = name.trim();
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Failed to create new user.".to_string()));
        }

        let user = self
            .users
            .insert(NewUser {
                name: name.to_string(),
                email,
                password_hash: self.hasher.hash(password)?,
            })
            .await?;

        tracing::info!(user = %user.id, "user signed up");
        Ok(Session {
            token: self.tokens.issue(user.id)?,
            user: user.public(),
        })
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<Session> {
        let invalid = || AppError::Unauthorized("Invalid credentials.".to_string());

        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !user.active || !self.hasher.verify(password, &user.password_hash) {
            return Err(invalid());
        }

        Ok(Session {
            token: self.tokens.issue(user.id)?,
            user: user.public(),
        })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<PublicUser> {
        let unauthorized = || AppError::Unauthorized("Access denied.".to_string());

        let user_id = self.tokens.verify(token).map_err(|err| {
            tracing::debug!(error = %err, "token rejected");
            unauthorized()
        })?;

        match self.users.find_by_id(user_id).await? {
            Some(user) if user.active => Ok(user.public()),
            _ => Err(unauthorized()),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
