//! User registry: accounts, credentials and per-user transaction history.
//!
//! Passwords are never stored; each user keeps an Argon2 PHC hash string.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ItemId;
use crate::error::{DonorError, Result};

/// Maximum username length in characters.
const MAX_USERNAME_LENGTH: usize = 64;

/// Borrow or return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Borrow,
    Return,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Borrow => "borrow",
            Self::Return => "return",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = DonorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "borrow" => Ok(Self::Borrow),
            "return" => Ok(Self::Return),
            other => Err(DonorError::Storage(format!(
                "Unknown transaction kind: {}",
                other
            ))),
        }
    }
}

/// A single borrow or return event in a user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier (UUID v7, time ordered)
    pub id: Uuid,

    /// Item the event refers to
    pub item_id: ItemId,

    /// Borrow or return
    pub kind: TransactionKind,

    /// Date the event happened
    pub date: NaiveDate,

    /// Due date, for borrow events
    pub due_date: Option<NaiveDate>,
}

impl Transaction {
    pub fn borrow(item_id: ItemId, date: NaiveDate, due_date: NaiveDate) -> Self {
        Self {
            id: Uuid::now_v7(),
            item_id,
            kind: TransactionKind::Borrow,
            date,
            due_date: Some(due_date),
        }
    }

    pub fn returned(item_id: ItemId, date: NaiveDate) -> Self {
        Self {
            id: Uuid::now_v7(),
            item_id,
            kind: TransactionKind::Return,
            date,
            due_date: None,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique username
    pub username: String,

    /// Argon2 PHC hash of the password
    pub password_hash: String,

    /// Items this user contributed
    pub contributions: BTreeSet<ItemId>,

    /// Borrow/return events, oldest first
    pub history: Vec<Transaction>,

    /// When the account was created
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Check a candidate password against the stored hash.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Integrity` if the stored hash is malformed.
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        verify_password(&self.password_hash, password)
    }
}

/// Hash a password into an Argon2 PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DonorError::Validation(format!("Failed to hash password: {}", e)))
}

/// Verify a password against an Argon2 PHC string.
pub fn verify_password(hash: &str, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| DonorError::Integrity(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Validate a username for registration.
///
/// # Requirements
///
/// - Not empty
/// - No whitespace anywhere
/// - At most 64 characters
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(DonorError::Validation(
            "Username cannot be empty".to_string(),
        ));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(DonorError::Validation(
            "Username cannot contain whitespace".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(DonorError::Validation(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    Ok(())
}

/// Username-keyed user store.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    users: BTreeMap<String, User>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_users(users: Vec<User>) -> Result<Self> {
        let mut registry = Self::new();
        for user in users {
            if registry.users.contains_key(&user.username) {
                return Err(DonorError::Integrity(format!(
                    "duplicate user {}",
                    user.username
                )));
            }
            registry.users.insert(user.username.clone(), user);
        }
        Ok(registry)
    }

    /// Create a user with empty contribution and history sets.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::DuplicateUser` if the username is taken, or
    /// `DonorError::Validation` if the username or password is unusable.
    pub(crate) fn register(
        &mut self,
        username: &str,
        password: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<&User> {
        validate_username(username)?;
        if self.users.contains_key(username) {
            return Err(DonorError::DuplicateUser(username.to_string()));
        }
        if password.is_empty() {
            return Err(DonorError::Validation(
                "Password cannot be empty".to_string(),
            ));
        }

        let user = User {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            contributions: BTreeSet::new(),
            history: Vec::new(),
            registered_at,
        };
        Ok(&*self.users.entry(username.to_string()).or_insert(user))
    }

    /// Return the user if the password matches.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Auth` for an unknown username or a wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<&User> {
        let user = self.users.get(username).ok_or(DonorError::Auth)?;
        if user.verify_password(password)? {
            Ok(user)
        } else {
            Err(DonorError::Auth)
        }
    }

    /// Get a user by name.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::NotFound` if no such user is registered.
    pub fn get(&self, username: &str) -> Result<&User> {
        self.users
            .get(username)
            .ok_or_else(|| DonorError::NotFound(format!("user {}", username)))
    }

    pub(crate) fn get_mut(&mut self, username: &str) -> Result<&mut User> {
        self.users
            .get_mut(username)
            .ok_or_else(|| DonorError::NotFound(format!("user {}", username)))
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Users in username order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_creates_empty_user() {
        let mut registry = Registry::new();
        let user = registry.register("alice", "s3cret", Utc::now()).unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.contributions.is_empty());
        assert!(user.history.is_empty());
        assert_ne!(user.password_hash, "s3cret");
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut registry = Registry::new();
        registry.register("alice", "one", Utc::now()).unwrap();
        let err = registry.register("alice", "two", Utc::now()).unwrap_err();
        assert!(matches!(err, DonorError::DuplicateUser(ref name) if name == "alice"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_bad_usernames() {
        let mut registry = Registry::new();
        assert!(registry.register("", "pw", Utc::now()).is_err());
        assert!(registry.register("al ice", "pw", Utc::now()).is_err());
        assert!(registry.register(&"x".repeat(65), "pw", Utc::now()).is_err());
        assert!(registry.register("alice", "", Utc::now()).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_authenticate() {
        let mut registry = Registry::new();
        registry.register("alice", "correct horse", Utc::now()).unwrap();

        assert_eq!(
            registry.authenticate("alice", "correct horse").unwrap().username,
            "alice"
        );
        assert!(matches!(
            registry.authenticate("alice", "battery staple"),
            Err(DonorError::Auth)
        ));
        assert!(matches!(
            registry.authenticate("mallory", "correct horse"),
            Err(DonorError::Auth)
        ));
    }

    #[test]
    fn test_malformed_hash_is_integrity_error() {
        assert!(matches!(
            verify_password("not-a-phc-string", "pw"),
            Err(DonorError::Integrity(_))
        ));
    }

    #[test]
    fn test_from_users_rejects_duplicates() {
        let user = User {
            username: "alice".to_string(),
            password_hash: hash_password("pw").unwrap(),
            contributions: BTreeSet::new(),
            history: Vec::new(),
            registered_at: Utc::now(),
        };
        let result = Registry::from_users(vec![user.clone(), user]);
        assert!(matches!(result, Err(DonorError::Integrity(_))));
    }
}
