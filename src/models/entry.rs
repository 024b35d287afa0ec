use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserRef;

/// One user's daily record. Primary key is `(user_id, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub success: bool,
    pub happy: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The wire form of an entry, keyed by date in the owner's entry map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryBody {
    pub success: bool,
    pub happy: bool,
    pub notes: String,
}

impl From<Entry> for EntryBody {
    fn from(e: Entry) -> Self {
        Self {
            success: e.success,
            happy: e.happy,
            notes: e.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertEntryRequest {
    pub date: NaiveDate,
    pub success: Option<bool>,
    pub happy: Option<bool>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Row shape for the by-date join against `users`.
#[derive(Debug, FromRow)]
pub struct EntryWithUserRow {
    pub date: NaiveDate,
    pub success: bool,
    pub happy: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryWithUser {
    pub date: NaiveDate,
    pub success: bool,
    pub happy: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub user: UserRef,
}

impl From<EntryWithUserRow> for EntryWithUser {
    fn from(r: EntryWithUserRow) -> Self {
        Self {
            date: r.date,
            success: r.success,
            happy: r.happy,
            notes: r.notes,
            created_at: r.created_at,
            user: UserRef {
                id: r.user_id,
                name: r.user_name,
                email: r.user_email,
                image: r.user_image,
            },
        }
    }
}
