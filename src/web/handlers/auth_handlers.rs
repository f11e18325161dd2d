// src/web/handlers/auth_handlers.rs
use crate::app_log;
use crate::auth::{AuthConfig, TokenPurpose};
use crate::core::{Database, MailClient, OutgoingMail};
use crate::models::Role;
use crate::repositories::users::NewUser;
use crate::repositories::UserRepository;
use crate::utils::{is_valid_email, normalize_text, MIN_PASSWORD_CHARS};
use crate::web::types::*;

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;

pub async fn register_handler(
    request: Json<RegisterRequest>,
    db: &State<Database>,
    auth_config: &State<AuthConfig>,
    mail: &State<MailClient>,
    config: &State<ServerConfig>,
) -> Result<Custom<Json<DataResponse<RegisterData>>>, ApiError> {
    let request = request.into_inner();
    let name = normalize_text(&request.name);
    let email = request.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Email address is not valid")
            .with_suggestion("Use the form name@example.com"));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    let password_hash = auth_config.hash_password(&request.password)?;
    let new_user = NewUser {
        name,
        email: email.clone(),
        password_hash,
        role: Role::Seeker,
        education: request.education.map(|e| normalize_text(&e)).unwrap_or_default(),
        skills: request.skills.map(SkillsInput::into_stored).unwrap_or_default(),
        disability_status: request.disability_status.unwrap_or_default(),
        is_verified: false,
    };

    let user = UserRepository::new(db.pool())
        .create(&new_user)
        .await?
        .ok_or_else(|| {
            ApiError::conflict("An account with this email already exists")
                .with_suggestion("Log in instead")
        })?;

    let mut warnings = Vec::new();
    let token = auth_config.issue_verification_token(&user)?;
    let verify_url = format!(
        "{}/api/auth/verify?token={}",
        config.public_url.trim_end_matches('/'),
        token
    );
    if let Err(e) = mail
        .send(&OutgoingMail::verification(&user.email, &user.name, &verify_url))
        .await
    {
        app_log!(error, "Verification email to {} failed: {}", user.email, e);
        warnings.push("Verification email could not be sent".to_string());
    }

    app_log!(info, "Registered seeker {}", user.email);

    Ok(Custom(
        Status::Created,
        Json(DataResponse::success(
            "Account created, check your inbox to verify your email",
            RegisterData { user, warnings },
        )),
    ))
}

pub async fn verify_email_handler(
    token: &str,
    db: &State<Database>,
    auth_config: &State<AuthConfig>,
) -> ApiResult<TextResponse> {
    let claims = auth_config
        .verify_token(token, TokenPurpose::Verify)
        .map_err(|e| {
            app_log!(warn, "Rejected verification token: {}", e);
            ApiError::bad_request("Verification link is invalid or expired")
                .with_suggestion("Request a new verification email")
        })?;

    if !UserRepository::new(db.pool()).set_verified(claims.sub).await? {
        return Err(ApiError::not_found("Account no longer exists"));
    }

    app_log!(info, "Verified email for user {}", claims.sub);
    Ok(Json(TextResponse::success("Email verified")))
}

pub async fn login_handler(
    request: Json<LoginRequest>,
    db: &State<Database>,
    auth_config: &State<AuthConfig>,
) -> ApiResult<DataResponse<LoginData>> {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = UserRepository::new(db.pool())
        .find_by_email(&request.email)
        .await?
        .ok_or_else(invalid)?;

    if !auth_config.verify_password(&request.password, &user.password_hash) {
        app_log!(warn, "Failed login for {}", user.email);
        return Err(invalid());
    }

    let token = auth_config.issue_session_token(&user)?;
    app_log!(info, "User {} logged in", user.email);

    Ok(Json(DataResponse::success(
        "Logged in",
        LoginData { token, user },
    )))
}
