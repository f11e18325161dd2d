// src/web/mod.rs

pub mod handlers;
pub mod relay;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::app_log;
use crate::auth::{AdminUser, AuthConfig, AuthFailure, AuthenticatedUser, OptionalAuth, SeekerUser};
use crate::core::fs_ops::UPLOADS_ROUTE;
use crate::core::{CalendarClient, ConfigManager, Database, FsOps, MailClient};
use crate::models::{Application, Job, Message, Notification, User};
use crate::repositories::messages::ConversationSummary;
use anyhow::Result;
use relay::MessageRelay;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::fs::FileServer;
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::response::stream::EventStream;
use rocket::serde::json::Json;
use rocket::{
    catchers, delete, get, options, patch, post, put, routes, Build, Request, Response, Rocket,
    Shutdown, State,
};

// CORS Fairing
pub struct Cors {
    allowed_origin: String,
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new(
            "Access-Control-Allow-Origin",
            self.allowed_origin.clone(),
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Authorization, Content-Type",
        ));
        if self.allowed_origin != "*" {
            response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        }
    }
}

// Auth

#[post("/auth/register", data = "<request>")]
pub async fn register(
    request: Json<RegisterRequest>,
    db: &State<Database>,
    auth_config: &State<AuthConfig>,
    mail: &State<MailClient>,
    config: &State<ServerConfig>,
) -> Result<Custom<Json<DataResponse<RegisterData>>>, ApiError> {
    handlers::register_handler(request, db, auth_config, mail, config).await
}

#[get("/auth/verify?<token>")]
pub async fn verify_email(
    token: &str,
    db: &State<Database>,
    auth_config: &State<AuthConfig>,
) -> ApiResult<TextResponse> {
    handlers::verify_email_handler(token, db, auth_config).await
}

#[post("/auth/login", data = "<request>")]
pub async fn login(
    request: Json<LoginRequest>,
    db: &State<Database>,
    auth_config: &State<AuthConfig>,
) -> ApiResult<DataResponse<LoginData>> {
    handlers::login_handler(request, db, auth_config).await
}

// Profile

#[get("/me")]
pub async fn get_profile(auth: AuthenticatedUser) -> Json<DataResponse<User>> {
    handlers::get_profile_handler(auth).await
}

#[put("/me", data = "<request>")]
pub async fn update_profile(
    request: Json<ProfileUpdateRequest>,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<User>> {
    handlers::update_profile_handler(request, auth, db).await
}

// Jobs

#[get("/jobs")]
pub async fn list_jobs(db: &State<Database>) -> ApiResult<DataResponse<Vec<Job>>> {
    handlers::list_jobs_handler(db).await
}

#[get("/jobs/matching")]
pub async fn matching_jobs(
    seeker: SeekerUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<MatchedJob>>> {
    handlers::matching_jobs_handler(seeker, db).await
}

#[get("/jobs/mine")]
pub async fn my_jobs(admin: AdminUser, db: &State<Database>) -> ApiResult<DataResponse<Vec<AdminJob>>> {
    handlers::my_jobs_handler(admin, db).await
}

#[get("/jobs/<id>")]
pub async fn get_job(id: i64, db: &State<Database>) -> ApiResult<DataResponse<Job>> {
    handlers::get_job_handler(id, db).await
}

#[post("/jobs", data = "<request>")]
pub async fn create_job(
    request: Json<CreateJobRequest>,
    admin: AdminUser,
    db: &State<Database>,
) -> Result<Custom<Json<DataResponse<Job>>>, ApiError> {
    handlers::create_job_handler(request, admin, db).await
}

#[put("/jobs/<id>", data = "<request>")]
pub async fn update_job(
    id: i64,
    request: Json<UpdateJobRequest>,
    admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Job>> {
    handlers::update_job_handler(id, request, admin, db).await
}

#[delete("/jobs/<id>")]
pub async fn delete_job(id: i64, admin: AdminUser, db: &State<Database>) -> ApiResult<ActionResponse> {
    handlers::delete_job_handler(id, admin, db).await
}

// Applications

#[post("/jobs/<id>/apply", data = "<upload>")]
pub async fn apply(
    id: i64,
    upload: Form<ApplyForm<'_>>,
    seeker: SeekerUser,
    db: &State<Database>,
    config: &State<ServerConfig>,
) -> Result<Custom<Json<DataResponse<Application>>>, ApiError> {
    handlers::apply_handler(id, upload, seeker, db, config).await
}

#[get("/jobs/<id>/applicants")]
pub async fn applicants(
    id: i64,
    admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<ApplicantView>>> {
    handlers::applicants_handler(id, admin, db).await
}

#[get("/applications/mine")]
pub async fn my_applications(
    seeker: SeekerUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<SeekerApplicationView>>> {
    handlers::my_applications_handler(seeker, db).await
}

#[patch("/applications/<id>/status", data = "<request>")]
pub async fn update_status(
    id: i64,
    request: Json<StatusUpdateRequest>,
    admin: AdminUser,
    db: &State<Database>,
    mail: &State<MailClient>,
    calendar: &State<CalendarClient>,
) -> ApiResult<DataResponse<StatusChangeData>> {
    handlers::update_status_handler(id, request, admin, db, mail, calendar).await
}

#[patch("/applications/<id>/score", data = "<request>")]
pub async fn update_score(
    id: i64,
    request: Json<ScoreRequest>,
    admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Application>> {
    handlers::update_score_handler(id, request, admin, db).await
}

// Notifications

#[get("/notifications")]
pub async fn list_notifications(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<Notification>>> {
    handlers::list_notifications_handler(auth, db).await
}

#[get("/notifications/unread-count")]
pub async fn unread_count(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<CountData>> {
    handlers::unread_count_handler(auth, db).await
}

#[patch("/notifications/read-all")]
pub async fn mark_all_read(auth: AuthenticatedUser, db: &State<Database>) -> ApiResult<ActionResponse> {
    handlers::mark_all_read_handler(auth, db).await
}

#[patch("/notifications/<id>/read")]
pub async fn mark_read(
    id: i64,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<ActionResponse> {
    handlers::mark_read_handler(id, auth, db).await
}

// Messages

#[post("/messages", data = "<request>")]
pub async fn send_message(
    request: Json<SendMessageRequest>,
    auth: AuthenticatedUser,
    db: &State<Database>,
    relay: &State<MessageRelay>,
) -> Result<Custom<Json<DataResponse<Message>>>, ApiError> {
    handlers::send_message_handler(request, auth, db, relay).await
}

#[get("/messages/conversations")]
pub async fn conversations(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<ConversationSummary>>> {
    handlers::conversations_handler(auth, db).await
}

#[get("/messages/with/<user_id>")]
pub async fn conversation_with(
    user_id: i64,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<Message>>> {
    handlers::conversation_with_handler(user_id, auth, db).await
}

#[get("/messages/stream")]
pub fn message_stream(
    auth: AuthenticatedUser,
    relay: &State<MessageRelay>,
    shutdown: Shutdown,
) -> EventStream![] {
    handlers::message_stream_handler(auth, relay, shutdown)
}

// System

#[get("/health")]
pub async fn health(
    auth: OptionalAuth,
    db: &State<Database>,
    mail: &State<MailClient>,
    calendar: &State<CalendarClient>,
) -> Json<DataResponse<HealthData>> {
    handlers::health_handler(auth, db, mail, calendar).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers

fn error_body(error: &str, code: &str, suggestions: &[&str]) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        error.to_string(),
        code.to_string(),
        suggestions.iter().map(|s| s.to_string()).collect(),
    ))
}

#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    error_body(
        "Invalid request format",
        "BAD_REQUEST",
        &[
            "Check your request body format",
            "Verify all required fields are present",
        ],
    )
}

#[rocket::catch(401)]
pub fn unauthorized(req: &Request) -> Json<StandardErrorResponse> {
    let failure = req.local_cache(AuthFailure::default);
    let message = failure
        .0
        .map(|e| e.message())
        .unwrap_or("Authentication required");
    error_body(message, "UNAUTHORIZED", &["Log in and send the token as a Bearer header"])
}

#[rocket::catch(403)]
pub fn forbidden(req: &Request) -> Json<StandardErrorResponse> {
    let failure = req.local_cache(AuthFailure::default);
    let message = failure.0.map(|e| e.message()).unwrap_or("Access denied");
    error_body(message, "FORBIDDEN", &[])
}

#[rocket::catch(404)]
pub fn not_found(req: &Request) -> Json<StandardErrorResponse> {
    error_body(
        &format!("No route for {}", req.uri().path()),
        "NOT_FOUND",
        &["Check the URL and HTTP method"],
    )
}

#[rocket::catch(413)]
pub fn payload_too_large() -> Json<StandardErrorResponse> {
    error_body(
        "Upload is too large",
        "PAYLOAD_TOO_LARGE",
        &["Attach smaller documents"],
    )
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    error_body(
        "Request body could not be understood",
        "UNPROCESSABLE_ENTITY",
        &["Check field names and value types"],
    )
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    error_body(
        "Internal server error",
        "INTERNAL_ERROR",
        &[
            "Try again in a few moments",
            "Contact support if the problem persists",
        ],
    )
}

/// Assemble the application: managed state, limits, routes and catchers
pub async fn build_rocket(config: &ConfigManager, db: Database) -> Result<Rocket<Build>> {
    FsOps::ensure_dir_exists(&config.storage.uploads_path).await?;

    let file_limit = config.storage.max_upload_mib.mebibytes();
    let form_limit = (config.storage.max_upload_mib * (MAX_DOCUMENTS as u64 + 1)).mebibytes();
    let limits = Limits::default()
        .limit("file", file_limit)
        .limit("data-form", form_limit)
        .limit("json", 1.mebibytes());

    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("limits", limits))
        .merge(("log_level", "critical"));

    let server_config = ServerConfig {
        uploads_dir: config.storage.uploads_path.clone(),
        public_url: config.server.public_url.clone(),
    };

    let rocket = rocket::custom(figment)
        .attach(Cors {
            allowed_origin: config.server.allowed_origin.clone(),
        })
        .manage(db)
        .manage(AuthConfig::from_config(config))
        .manage(MailClient::new(&config.mail)?)
        .manage(CalendarClient::new(&config.calendar)?)
        .manage(MessageRelay::new())
        .manage(server_config)
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                payload_too_large,
                unprocessable,
                internal_error
            ],
        )
        .mount(
            "/api",
            routes![
                register,
                verify_email,
                login,
                get_profile,
                update_profile,
                list_jobs,
                matching_jobs,
                my_jobs,
                get_job,
                create_job,
                update_job,
                delete_job,
                apply,
                applicants,
                my_applications,
                update_status,
                update_score,
                list_notifications,
                unread_count,
                mark_all_read,
                mark_read,
                send_message,
                conversations,
                conversation_with,
                message_stream,
                health,
                options,
            ],
        )
        .mount(UPLOADS_ROUTE, FileServer::from(&config.storage.uploads_path));

    Ok(rocket)
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let db = Database::new(&config.storage.database_path).await?;

    app_log!(info, "Starting job board API server ({})", config.environment);
    app_log!(info, "Database: {}", config.storage.database_path.display());
    app_log!(info, "Uploads: {}", config.storage.uploads_path.display());
    app_log!(
        info,
        "Server: http://{}:{}",
        config.server.address,
        config.server.port
    );

    let rocket = build_rocket(&config, db).await?;
    rocket
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {}", e))?;

    app_log!(info, "Server stopped");
    Ok(())
}
