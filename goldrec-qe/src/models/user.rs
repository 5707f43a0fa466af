//! Users as seen through the identity/role provider

use serde::{Deserialize, Serialize};

/// Role assigned by the identity provider
///
/// Only `Admin` carries authority in this service (proxy review).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    QualityEngineer,
    Reviewer,
    Operator,
}

impl Role {
    /// Parse a configured role name; unknown names get the least privilege
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Role::Admin,
            "quality_engineer" | "quality-engineer" => Role::QualityEngineer,
            "reviewer" => Role::Reviewer,
            _ => Role::Operator,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::QualityEngineer => "quality_engineer",
            Role::Reviewer => "reviewer",
            Role::Operator => "operator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: Role,
}

impl User {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
