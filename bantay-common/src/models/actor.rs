//! Users and the acting identity threaded through workflow operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

closed_set! {
    /// Role held by a registered user
    ActorRole, "role" {
        Citizen => "citizen",
        PurokLeader => "purok_leader",
        Operator => "operator",
    }
}

/// Identity performing an operation.
///
/// Passed explicitly into every workflow call; there is no ambient "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self { id, role }
    }

    /// Operators may act on any distributed concern
    pub fn has_override(&self) -> bool {
        self.role == ActorRole::Operator
    }
}

/// Registered user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: ActorRole,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub purok: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn as_actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub role: ActorRole,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub purok: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Name must not be empty".to_string()));
        }
        if let Some(phone) = &self.phone {
            let digits = phone.trim_start_matches('+');
            if digits.len() < 7 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::Validation(format!("Invalid phone number '{}'", phone)));
            }
        }
        if let Some(email) = &self.email {
            let valid = email
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            if !valid {
                return Err(Error::Validation(format!("Invalid email address '{}'", email)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: ActorRole) -> NewUser {
        NewUser {
            name: "Maria Santos".to_string(),
            role,
            phone: Some("+639171234567".to_string()),
            email: Some("maria@example.ph".to_string()),
            purok: Some("Purok 3".to_string()),
        }
    }

    #[test]
    fn test_only_operators_override() {
        let id = Uuid::new_v4();
        assert!(Actor::new(id, ActorRole::Operator).has_override());
        assert!(!Actor::new(id, ActorRole::PurokLeader).has_override());
        assert!(!Actor::new(id, ActorRole::Citizen).has_override());
    }

    #[test]
    fn test_new_user_validation() {
        assert!(user(ActorRole::Citizen).validate().is_ok());

        let mut bad_phone = user(ActorRole::Citizen);
        bad_phone.phone = Some("call me".to_string());
        assert!(bad_phone.validate().is_err());

        let mut bad_email = user(ActorRole::PurokLeader);
        bad_email.email = Some("maria.example.ph".to_string());
        assert!(bad_email.validate().is_err());

        let mut nameless = user(ActorRole::Operator);
        nameless.name = String::new();
        assert!(nameless.validate().is_err());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(ActorRole::PurokLeader.as_str(), "purok_leader");
        assert_eq!("operator".parse::<ActorRole>().unwrap(), ActorRole::Operator);
    }
}
