use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::LearnerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("display name cannot be empty")]
    EmptyDisplayName,

    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Access level of a user. Accounts without an explicit role are cleaners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Cleaner,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Cleaner => "cleaner",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cleaner" => Ok(Role::Cleaner),
            "admin" => Ok(Role::Admin),
            other => Err(UserError::UnknownRole(other.to_owned())),
        }
    }
}

/// Stored account of a cleaner or administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    id: LearnerId,
    display_name: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// # Errors
    ///
    /// Returns `UserError::EmptyDisplayName` if the trimmed name is empty.
    pub fn new(
        id: LearnerId,
        display_name: impl Into<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let display_name = display_name.into().trim().to_owned();
        if display_name.is_empty() {
            return Err(UserError::EmptyDisplayName);
        }
        Ok(Self {
            id,
            display_name,
            role,
            created_at: now,
            updated_at: now,
        })
    }

    #[must_use]
    pub fn from_persisted(
        id: LearnerId,
        display_name: String,
        role: Role,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name,
            role,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: Role, updated_at: DateTime<Utc>) -> Self {
        self.role = role;
        self.updated_at = updated_at;
        self
    }

    #[must_use]
    pub fn id(&self) -> LearnerId {
        self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
