//! User domain entity
//!
//! Represents a person who pays for and shares expenses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Free-form details on how this user prefers to be paid back
    pub payment_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub payment_details: Option<String>,
}

impl NewUser {
    /// Trim and check the fields. Emails are stored lowercased.
    pub fn normalized(self) -> Result<Self, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() || name.chars().count() > 100 {
            return Err("Name must be between 1 and 100 characters".to_string());
        }

        let email = self.email.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(format!("Invalid email address: '{}'", self.email)),
        }

        let payment_details = self
            .payment_details
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            name,
            email,
            payment_details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            payment_details: None,
        }
    }

    #[test]
    fn normalized_trims_and_lowercases() {
        let user = new_user("  Alice ", " Alice@Example.COM ")
            .normalized()
            .unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn normalized_rejects_blank_name() {
        assert!(new_user("   ", "a@b.c").normalized().is_err());
    }

    #[test]
    fn normalized_rejects_bad_email() {
        assert!(new_user("Bob", "bob").normalized().is_err());
        assert!(new_user("Bob", "@example.com").normalized().is_err());
        assert!(new_user("Bob", "bob@").normalized().is_err());
    }

    #[test]
    fn normalized_drops_empty_payment_details() {
        let user = NewUser {
            payment_details: Some("  ".to_string()),
            ..new_user("Carol", "carol@example.com")
        }
        .normalized()
        .unwrap();
        assert!(user.payment_details.is_none());
    }

    #[test]
    fn user_id_display() {
        let id = UserId(Uuid::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn user_id_serializes_as_plain_uuid() {
        let id = UserId(Uuid::nil());
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"00000000-0000-0000-0000-000000000000\""
        );
    }
}
