//! Activity domain entity
//!
//! A group outing or event that expenses are booked against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Unique identifier for an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub Uuid);

impl ActivityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ActivityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An activity with a fixed set of participants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub participants: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn has_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }
}

/// Data needed to create a new activity
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub name: String,
    pub participants: Vec<UserId>,
}

/// Remove repeated ids, keeping the first occurrence of each
pub fn dedup_participants(participants: Vec<UserId>) -> Vec<UserId> {
    let mut seen = std::collections::HashSet::new();
    participants
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect()
}
