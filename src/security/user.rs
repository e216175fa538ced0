//! Users and API tokens

use dashmap::DashMap;
use rand::{distr::Alphanumeric, Rng};
use serde::Serialize;

use crate::core::error::{Error, Result};
use crate::core::types::{IdSequence, UserId};

/// Length of generated API tokens
const TOKEN_LENGTH: usize = 40;

/// An account able to call the API
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// User identifier
    pub id: UserId,

    /// Login name
    pub username: String,

    /// API token
    #[serde(skip_serializing)]
    pub token: String,

    /// Bypasses every permission check
    pub is_superuser: bool,

    /// Inactive users cannot authenticate
    pub is_active: bool,
}

/// Token to user lookup
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: DashMap<UserId, User>,
    tokens: DashMap<String, UserId>,
    ids: IdSequence,
}

impl UserRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user; a token is generated when `token` is `None`
    pub fn create_user(
        &self,
        username: &str,
        token: Option<String>,
        is_superuser: bool,
    ) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::validation("username", "This field may not be blank."));
        }
        if self.users.iter().any(|u| u.username == username) {
            return Err(Error::validation("username", "A user with that username already exists."));
        }

        let token = token.unwrap_or_else(generate_token);
        if self.tokens.contains_key(&token) {
            return Err(Error::validation("token", "Token already in use."));
        }

        let user = User {
            id: self.ids.next(),
            username: username.to_string(),
            token: token.clone(),
            is_superuser,
            is_active: true,
        };

        self.tokens.insert(token, user.id);
        self.users.insert(user.id, user.clone());
        tracing::info!(user = %user.username, superuser = is_superuser, "registered user");

        Ok(user)
    }

    /// Resolve a token to an active user
    pub fn authenticate(&self, token: &str) -> Result<User> {
        let id = *self.tokens.get(token).ok_or(Error::Unauthenticated)?;
        let user = self.get(id).ok_or(Error::Unauthenticated)?;
        if !user.is_active {
            return Err(Error::Unauthenticated);
        }
        Ok(user)
    }

    /// Look up a user by id
    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    /// Enable or disable a user
    pub fn set_active(&self, id: UserId, active: bool) -> Result<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("user {}", id)))?;
        user.is_active = active;
        Ok(())
    }

    /// Number of registered users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no user is registered
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
