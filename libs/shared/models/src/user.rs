use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Doctor,
    Patient,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Doctor => write!(f, "Doctor"),
            UserRole::Patient => write!(f, "Patient"),
        }
    }
}

/// Full stored row, password hash included. Never serialized outward; the
/// public shape is [`UserProfile`].
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user. Doctors always carry a specialization; patients
/// never do, so an unspecialized doctor is unrepresentable here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum UserProfile {
    Doctor {
        id: Uuid,
        name: String,
        email: String,
        specialization: String,
    },
    Patient {
        id: Uuid,
        name: String,
        email: String,
    },
}

impl UserProfile {
    pub fn id(&self) -> Uuid {
        match self {
            UserProfile::Doctor { id, .. } | UserProfile::Patient { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UserProfile::Doctor { name, .. } | UserProfile::Patient { name, .. } => name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            UserProfile::Doctor { email, .. } | UserProfile::Patient { email, .. } => email,
        }
    }
}
