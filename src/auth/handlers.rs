use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::{
        auth::AuthUser,
        credentials::{CredentialVerifier, Principal},
        jwt::generate_token,
    },
    config::Config,
    error::{AppError, AppResult, ok, ok_with_message},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(custom(function = "crate::api::not_blank", message = "Username is required"))]
    #[schema(example = "admin")]
    pub username: String,
    #[validate(custom(function = "crate::api::not_blank", message = "Password is required"))]
    #[schema(example = "admin123")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: Principal,
}

/// Login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid username or password", body = Object, example = json!({
            "status": "error",
            "message": "Invalid username or password"
        }))
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(body, verifier, config),
    fields(username = %body.username.trim())
)]
pub async fn login(
    body: web::Json<LoginRequest>,
    verifier: web::Data<dyn CredentialVerifier>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if let Err(e) = body.validate() {
        info!("Validation failed: empty username or password");
        return Err(e.into());
    }

    let LoginRequest { username, password } = body.into_inner();
    let verifier = verifier.into_inner();
    // argon2 is CPU bound, keep it off the worker thread
    let verified = web::block(move || verifier.verify(username.trim(), &password))
        .await
        .map_err(|e| {
            error!(error = %e, "Credential check did not complete");
            AppError::Internal(e.to_string())
        })?;

    let Some(principal) = verified else {
        info!("Invalid credentials");
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    };

    debug!(role = %principal.role, "Generating access token");

    let token = generate_token(&principal, &config.jwt_secret, config.token_ttl).map_err(|e| {
        error!(error = %e, "Failed to sign token");
        AppError::Internal(e.to_string())
    })?;

    info!("Login successful");

    Ok(ok_with_message(
        LoginResponse {
            token,
            user: principal,
        },
        "Login successful",
    ))
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Claims of the bearer token", body = Object, example = json!({
            "status": "success",
            "data": { "user": { "sub": "admin", "username": "admin", "role": "admin", "iat": 1709251200, "exp": 1709337600, "jti": "1b4e28ba-2fa1-11d2-883f-0016d3cca427" } }
        })),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    tag = "Auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(user: AuthUser) -> HttpResponse {
    ok(json!({ "user": user.claims }))
}
