//! Audit log domain entity
//!
//! An append-only trail of every mutation made to the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Unique identifier for an audit log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLogId(pub Uuid);

impl AuditLogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to the entity. The ledger is append-only, so creation is
/// the only mutation today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Create => write!(f, "create"),
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(AuditAction::Create),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

/// Kind of ledger record an audit entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    User,
    Activity,
    Expense,
    Payment,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::User => write!(f, "user"),
            EntityType::Activity => write!(f, "activity"),
            EntityType::Expense => write!(f, "expense"),
            EntityType::Payment => write!(f, "payment"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(EntityType::User),
            "activity" => Ok(EntityType::Activity),
            "expense" => Ok(EntityType::Expense),
            "payment" => Ok(EntityType::Payment),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    /// The user the change is attributed to, when there is one
    pub user_id: Option<UserId>,
    pub details: Option<serde_json::Value>,
}

/// Data needed to append an audit entry
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub user_id: Option<UserId>,
    pub details: Option<serde_json::Value>,
}

impl NewAuditLog {
    pub fn created(entity_type: EntityType, entity_id: Uuid) -> Self {
        Self {
            action: AuditAction::Create,
            entity_type,
            entity_id,
            user_id: None,
            details: None,
        }
    }

    pub fn by(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_round_trips_through_str() {
        for ty in [
            EntityType::User,
            EntityType::Activity,
            EntityType::Expense,
            EntityType::Payment,
        ] {
            assert_eq!(ty.to_string().parse::<EntityType>().unwrap(), ty);
        }
        assert!("ticket".parse::<EntityType>().is_err());
    }

    #[test]
    fn audit_action_from_str_is_case_insensitive() {
        assert_eq!("CREATE".parse::<AuditAction>().unwrap(), AuditAction::Create);
        assert!("delete".parse::<AuditAction>().is_err());
    }

    #[test]
    fn builder_sets_user_and_details() {
        let user = UserId::new();
        let entry = NewAuditLog::created(EntityType::Payment, Uuid::nil())
            .by(user)
            .with_details(serde_json::json!({"amount": "3"}));
        assert_eq!(entry.action, AuditAction::Create);
        assert_eq!(entry.user_id, Some(user));
        assert_eq!(entry.details.unwrap()["amount"], "3");
    }
}
