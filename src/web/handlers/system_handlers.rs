// src/web/handlers/system_handlers.rs
use crate::app_log;
use crate::auth::OptionalAuth;
use crate::core::{CalendarClient, Database, MailClient};
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;

pub async fn health_handler(
    auth: OptionalAuth,
    db: &State<Database>,
    mail: &State<MailClient>,
    calendar: &State<CalendarClient>,
) -> Json<DataResponse<HealthData>> {
    if let Some(user) = auth.user {
        app_log!(debug, "Health check by authenticated user: {}", user.email());
    } else {
        app_log!(debug, "Health check by anonymous user");
    }

    let database = match db.health_check().await {
        Ok(()) => true,
        Err(e) => {
            app_log!(error, "Database health check failed: {}", e);
            false
        }
    };

    Json(DataResponse::success(
        if database { "OK" } else { "DEGRADED" },
        HealthData {
            status: if database { "ok" } else { "degraded" },
            database,
            mail_enabled: mail.is_enabled(),
            calendar_enabled: calendar.is_enabled(),
        },
    ))
}
