use serde::{Deserialize, Serialize};

use crate::model::quote::Quote;
use crate::util::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Staff,
    Customer,
}

impl Role {
    pub fn from_claim(role: &str) -> Role {
        match role {
            "owner" => Role::Owner,
            "staff" | "admin" => Role::Staff,
            _ => Role::Customer,
        }
    }
}

/// Authorization capability passed into every pipeline operation and
/// checked once at the entry of each operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Owner | Role::Staff)
    }

    pub fn require_staff(&self) -> Result<(), ServiceError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "staff or owner role required".to_string(),
            ))
        }
    }

    /// Staff can act on any quote; a customer only on their own.
    pub fn require_quote_access(&self, quote: &Quote) -> Result<(), ServiceError> {
        if self.is_staff() || self.email.eq_ignore_ascii_case(&quote.email) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "quote belongs to another customer".to_string(),
            ))
        }
    }
}
