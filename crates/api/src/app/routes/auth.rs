use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use stockroom_auth::{hash_password, verify_password, Credentials};

use crate::app::services::Services;
use crate::app::{dto, errors};

pub async fn register(
    Extension(services): Extension<Arc<Services>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    let creds = match Credentials::validated(&body.username, &body.password) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let password_hash = match hash_password(&creds.password) {
        Ok(h) => h,
        Err(e) => {
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "crypto_error",
                e.to_string(),
            )
        }
    };

    match services.users.create_user(&creds.username, &password_hash).await {
        Ok(user) => {
            tracing::info!(user_id = user.id.as_i64(), "user registered");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "id": user.id.as_i64(),
                    "username": user.username,
                })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<Services>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let username = body.username.trim();

    let user = match services.users.find_user_by_username(username).await {
        Ok(Some(u)) => u,
        Ok(None) => return rejected(),
        Err(e) => return errors::store_error_to_response(e),
    };

    // Unknown user and bad password are indistinguishable to the caller.
    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return rejected(),
        Err(e) => {
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "crypto_error",
                e.to_string(),
            )
        }
    }

    match services.tokens.issue(user.id, &user.username, Utc::now()) {
        Ok(token) => Json(serde_json::json!({ "token": token })).into_response(),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "crypto_error",
            e.to_string(),
        ),
    }
}

fn rejected() -> axum::response::Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        "invalid username or password",
    )
}
