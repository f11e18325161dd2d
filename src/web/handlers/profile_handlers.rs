// src/web/handlers/profile_handlers.rs
use crate::app_log;
use crate::auth::AuthenticatedUser;
use crate::core::Database;
use crate::models::User;
use crate::repositories::users::ProfileUpdate;
use crate::repositories::UserRepository;
use crate::utils::normalize_text;
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;

pub async fn get_profile_handler(auth: AuthenticatedUser) -> Json<DataResponse<User>> {
    Json(DataResponse::success("Profile", auth.user))
}

pub async fn update_profile_handler(
    request: Json<ProfileUpdateRequest>,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<User>> {
    let request = request.into_inner();

    let name = request.name.map(|n| normalize_text(&n));
    if name.as_deref() == Some("") {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }

    let update = ProfileUpdate {
        name,
        education: request.education.map(|e| normalize_text(&e)),
        skills: request.skills.map(SkillsInput::into_stored),
        disability_status: request.disability_status,
    };

    let user = UserRepository::new(db.pool())
        .update_profile(auth.id(), &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Account no longer exists"))?;

    app_log!(info, "Updated profile of {}", user.email);
    Ok(Json(DataResponse::success("Profile updated", user)))
}
