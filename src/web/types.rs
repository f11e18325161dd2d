// src/web/types.rs
use chrono::{DateTime, Utc};
use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::Request;
use std::fmt::Display;
use std::path::PathBuf;

use crate::app_log;
use crate::lifecycle::ApplicationStatus;
use crate::matching::join_skills;
use crate::models::{Application, DisabilityStatus, Job, User};

pub const MAX_DOCUMENTS: usize = 7;

pub struct ServerConfig {
    pub uploads_dir: PathBuf,
    pub public_url: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

impl TextResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message: message.into(),
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message: message.into(),
            data,
        }
    }
}

impl ActionResponse {
    pub fn success(message: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message: message.into(),
            action: action.into(),
        }
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

/// JSON error body paired with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub error: String,
    pub error_code: &'static str,
    pub suggestions: Vec<String>,
}

impl ApiError {
    pub fn new(status: Status, error: impl Into<String>, error_code: &'static str) -> Self {
        Self {
            status,
            error: error.into(),
            error_code,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, error, "BAD_REQUEST")
    }

    pub fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(Status::Unauthorized, error, "UNAUTHORIZED")
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, error, "FORBIDDEN")
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(Status::NotFound, error, "NOT_FOUND")
    }

    pub fn conflict(error: impl Into<String>) -> Self {
        Self::new(Status::Conflict, error, "CONFLICT")
    }

    /// Log the cause and hide it behind a generic 500
    pub fn internal(context: &str, cause: impl Display) -> Self {
        app_log!(error, "{}: {}", context, cause);
        Self::new(Status::InternalServerError, "Internal server error", "INTERNAL_ERROR")
            .with_suggestion("Try again in a few moments")
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::internal("Request failed", e)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let body = StandardErrorResponse::new(self.error, self.error_code.to_string(), self.suggestions);
        (self.status, Json(body)).respond_to(req)
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Skills arrive either as a comma-separated string or as a list
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "rocket::serde", untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Text(String),
}

impl SkillsInput {
    pub fn into_stored(self) -> String {
        match self {
            SkillsInput::List(items) => join_skills(&items),
            SkillsInput::Text(text) => text.trim().to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub education: Option<String>,
    pub skills: Option<SkillsInput>,
    pub disability_status: Option<DisabilityStatus>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct LoginData {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RegisterData {
    pub user: User,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub education: Option<String>,
    pub skills: Option<SkillsInput>,
    pub disability_status: Option<DisabilityStatus>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub education: String,
    pub skills: Option<SkillsInput>,
    #[serde(default)]
    pub employment_type: String,
    #[serde(default)]
    pub disability_status: DisabilityStatus,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub education: Option<String>,
    pub skills: Option<SkillsInput>,
    pub employment_type: Option<String>,
    pub disability_status: Option<DisabilityStatus>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct MatchedJob {
    #[serde(flatten)]
    pub job: Job,
    pub score: u32,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AdminJob {
    #[serde(flatten)]
    pub job: Job,
    pub applicant_count: i64,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SeekerApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ApplicantView {
    pub application: Application,
    pub seeker: User,
    pub score: u32,
}

#[derive(FromForm)]
pub struct ApplyForm<'f> {
    pub documents: Vec<TempFile<'f>>,
    pub cover_note: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
    pub interview_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StatusChangeData {
    pub application: Application,
    pub meeting_link: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ScoreRequest {
    pub score: i64,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CountData {
    pub count: i64,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    pub content: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthData {
    pub status: &'static str,
    pub database: bool,
    pub mail_enabled: bool,
    pub calendar_enabled: bool,
}
