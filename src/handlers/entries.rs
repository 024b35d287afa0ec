use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::aggregate;
use crate::auth::middleware::AuthUser;
use crate::calendar;
use crate::error::{AppError, AppResult};
use crate::models::entry::{Entry, EntryBody, EntryWithUser, EntryWithUserRow, UpsertEntryRequest};
use crate::models::user::UserRef;
use crate::AppState;

/// GET /entries — the caller's entries as a date-keyed map.
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<std::collections::BTreeMap<NaiveDate, EntryBody>>> {
    let rows = sqlx::query_as::<_, Entry>(
        r#"
        SELECT * FROM entries
        WHERE user_id = $1
        ORDER BY date DESC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(aggregate::entry_map(rows)))
}

/// POST /entries — upsert the caller's entry for a date. Creates the user
/// profile row lazily from the auth token's claims on first save.
pub async fn upsert_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpsertEntryRequest>,
) -> AppResult<Json<EntryBody>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // An entry is only meaningful with both flags set.
    let (success, happy) = match (body.success, body.happy) {
        (Some(s), Some(h)) => (s, h),
        _ => {
            return Err(AppError::Validation(
                "Both success and happy are required".into(),
            ))
        }
    };
    let notes = body.notes.as_deref().unwrap_or("").trim().to_string();

    let display_name = auth_user
        .name
        .clone()
        .unwrap_or_else(|| auth_user.email.clone());
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, image)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(auth_user.id)
    .bind(&display_name)
    .bind(&auth_user.email)
    .bind(&auth_user.image)
    .execute(&state.db)
    .await?;

    // Last write wins: the whole entry is overwritten, no versioning.
    let entry = sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries (user_id, date, success, happy, notes)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, date) DO UPDATE SET
            success = EXCLUDED.success,
            happy = EXCLUDED.happy,
            notes = EXCLUDED.notes,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(body.date)
    .bind(success)
    .bind(happy)
    .bind(&notes)
    .fetch_one(&state.db)
    .await?;

    tracing::debug!(user = %auth_user.id, date = %entry.date, "Entry saved");

    Ok(Json(entry.into()))
}

/// DELETE /entries/:date — remove the caller's entry for a date.
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM entries WHERE user_id = $1 AND date = $2")
        .bind(auth_user.id)
        .bind(date)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct ByDateQuery {
    pub date: Option<String>,
}

/// GET /entries/by-date?date=YYYY-MM-DD — all users' entries for one date
/// with their joined profiles.
pub async fn entries_by_date(
    State(state): State<AppState>,
    Query(query): Query<ByDateQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let date = query
        .date
        .ok_or_else(|| AppError::Validation("Date parameter is required".into()))?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Date must be YYYY-MM-DD".into()))?;

    let rows = sqlx::query_as::<_, EntryWithUserRow>(
        r#"
        SELECT e.date, e.success, e.happy, e.notes, e.created_at,
               u.id AS user_id, u.name AS user_name, u.email AS user_email,
               u.image AS user_image
        FROM entries e
        JOIN users u ON u.id = e.user_id
        WHERE e.date = $1
        ORDER BY e.created_at DESC
        "#,
    )
    .bind(date)
    .fetch_all(&state.db)
    .await?;

    let entries: Vec<EntryWithUser> = rows.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "entries": entries })))
}

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, sqlx::FromRow)]
struct MonthlyRow {
    date: NaiveDate,
    id: Uuid,
    name: String,
    email: String,
    image: Option<String>,
}

/// GET /entries/monthly?year=YYYY&month=MM — distinct-user counts per date
/// for the month. The range is clamped to the month's true last day.
pub async fn monthly_counts(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (year, month) = match (query.year, query.month) {
        (Some(y), Some(m)) => (y, m),
        _ => {
            return Err(AppError::Validation(
                "Year and month parameters are required".into(),
            ))
        }
    };
    let (start, end) = calendar::month_bounds(year, month)
        .ok_or_else(|| AppError::Validation("Invalid year or month".into()))?;

    let rows = sqlx::query_as::<_, MonthlyRow>(
        r#"
        SELECT e.date, u.id, u.name, u.email, u.image
        FROM entries e
        JOIN users u ON u.id = e.user_id
        WHERE e.date BETWEEN $1 AND $2
        ORDER BY e.date ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    let rows = rows
        .into_iter()
        .map(|r| {
            (
                r.date,
                UserRef {
                    id: r.id,
                    name: r.name,
                    email: r.email,
                    image: r.image,
                },
            )
        })
        .collect();

    Ok(Json(json!({ "entries": aggregate::community_counts(rows) })))
}
