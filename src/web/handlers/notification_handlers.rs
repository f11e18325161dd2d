// src/web/handlers/notification_handlers.rs
use crate::auth::AuthenticatedUser;
use crate::core::Database;
use crate::models::Notification;
use crate::repositories::NotificationRepository;
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;

pub async fn list_notifications_handler(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<Notification>>> {
    let notifications = NotificationRepository::new(db.pool())
        .list_for_user(auth.id())
        .await?;
    Ok(Json(DataResponse::success(
        format!("{} notification(s)", notifications.len()),
        notifications,
    )))
}

pub async fn unread_count_handler(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<CountData>> {
    let count = NotificationRepository::new(db.pool())
        .unread_count(auth.id())
        .await?;
    Ok(Json(DataResponse::success("Unread notifications", CountData { count })))
}

pub async fn mark_read_handler(
    id: i64,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<ActionResponse> {
    // someone else's notification looks exactly like a missing one
    if !NotificationRepository::new(db.pool())
        .mark_read(id, auth.id())
        .await?
    {
        return Err(ApiError::not_found(format!("Notification {} not found", id)));
    }
    Ok(Json(ActionResponse::success("Notification marked as read", "read")))
}

pub async fn mark_all_read_handler(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<ActionResponse> {
    let updated = NotificationRepository::new(db.pool())
        .mark_all_read(auth.id())
        .await?;
    Ok(Json(ActionResponse::success(
        format!("{} notification(s) marked as read", updated),
        "read_all",
    )))
}
