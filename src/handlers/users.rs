use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateWalletRequest {
    #[serde(rename = "walletAddress")]
    pub wallet_address: Option<String>,
}

/// GET /users/wallet — the caller's stored chain address, null if none.
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let wallet = sqlx::query_scalar::<_, Option<String>>(
        "SELECT wallet_address FROM users WHERE id = $1",
    )
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .flatten();

    Ok(Json(json!({ "walletAddress": wallet })))
}

/// POST /users/wallet — store the caller's chain address.
pub async fn update_wallet(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateWalletRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let address = body
        .wallet_address
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::Validation("Wallet address is required".into()))?;

    if !is_evm_address(&address) {
        return Err(AppError::Validation("Invalid wallet address".into()));
    }

    let result = sqlx::query("UPDATE users SET wallet_address = $1 WHERE id = $2")
        .bind(&address)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    Ok(Json(json!({ "success": true, "walletAddress": address })))
}

/// `0x` followed by 20 hex bytes.
fn is_evm_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(rest) => rest.len() == 40 && rest.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_evm_address() {
        assert!(is_evm_address(
            "0x52908400098527886E0F7030069857D2E4169EE7"
        ));
        assert!(!is_evm_address("52908400098527886E0F7030069857D2E4169EE7"));
        assert!(!is_evm_address("0x1234"));
        assert!(!is_evm_address("0xZZ08400098527886E0F7030069857D2E4169EE7"));
    }
}
