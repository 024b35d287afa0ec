use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Profile row mirroring the hosted auth identity. Created lazily on a
/// user's first entry save.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public slice of a profile, joined onto community entry views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}
