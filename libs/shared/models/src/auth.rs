use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub iat: Option<u64>,
    pub exp: Option<u64>,
}

/// Identity carried through the request pipeline once the bearer token has
/// been validated. All fields come from the token claims; no store lookup
/// happens per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}
