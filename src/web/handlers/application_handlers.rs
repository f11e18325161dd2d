// src/web/handlers/application_handlers.rs
use crate::app_log;
use crate::auth::{AdminUser, SeekerUser};
use crate::core::{CalendarClient, Database, FsOps, MailClient};
use crate::lifecycle::{ApplicationWorkflow, StatusChangeError, StatusChangeRequest};
use crate::matching::rank_applicants;
use crate::models::Application;
use crate::repositories::{ApplicationRepository, JobRepository, NotificationRepository};
use crate::utils::document_extension;
use crate::web::handlers::job_handlers::load_owned_job;
use crate::web::types::*;

use rocket::form::Form;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;

const DOCUMENTS_CATEGORY: &str = "applications";

pub async fn apply_handler(
    job_id: i64,
    upload: Form<ApplyForm<'_>>,
    seeker: SeekerUser,
    db: &State<Database>,
    config: &State<ServerConfig>,
) -> Result<Custom<Json<DataResponse<Application>>>, ApiError> {
    let mut upload = upload.into_inner();

    let job = JobRepository::new(db.pool())
        .find_by_id(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", job_id)))?;

    // browsers submit an empty part for an untouched file input
    upload.documents.retain(|file| file.len() > 0);

    if upload.documents.len() > MAX_DOCUMENTS {
        return Err(ApiError::bad_request(format!(
            "At most {} documents can be attached, got {}",
            MAX_DOCUMENTS,
            upload.documents.len()
        )));
    }

    // Validate every file before anything touches the disk
    let mut extensions = Vec::with_capacity(upload.documents.len());
    for file in &upload.documents {
        let raw_name = file
            .raw_name()
            .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str());
        let ext = document_extension(file.content_type(), raw_name).map_err(|e| {
            ApiError::bad_request(e.to_string())
                .with_suggestion("Attach PDF, DOC, DOCX, PNG or JPEG files")
        })?;
        extensions.push(ext);
    }

    let mut urls = Vec::with_capacity(upload.documents.len());
    for (file, ext) in upload.documents.iter_mut().zip(extensions) {
        let (path, url) = FsOps::allocate_upload(&config.uploads_dir, DOCUMENTS_CATEGORY, ext).await?;
        if let Err(e) = file.move_copy_to(&path).await {
            FsOps::remove_uploads(&config.uploads_dir, &urls).await;
            return Err(ApiError::internal("Failed to store uploaded document", e));
        }
        urls.push(url);
    }

    let cover_note = upload
        .cover_note
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty());

    let created = ApplicationRepository::new(db.pool())
        .create(job.id, seeker.id(), cover_note, &urls)
        .await;

    let application = match created {
        Ok(Some(application)) => application,
        Ok(None) => {
            FsOps::remove_uploads(&config.uploads_dir, &urls).await;
            return Err(ApiError::conflict("You already applied to this job"));
        }
        Err(e) => {
            FsOps::remove_uploads(&config.uploads_dir, &urls).await;
            return Err(e.into());
        }
    };

    let note = format!(
        "{} applied to \"{}\"",
        seeker.user().name,
        job.title
    );
    if let Err(e) = NotificationRepository::new(db.pool())
        .create(job.admin_id, &note)
        .await
    {
        app_log!(error, "Failed to notify admin {} of application {}: {}", job.admin_id, application.id, e);
    }

    Ok(Custom(
        Status::Created,
        Json(DataResponse::success(
            format!("Applied to \"{}\" with {} document(s)", job.title, urls.len()),
            application,
        )),
    ))
}

pub async fn my_applications_handler(
    seeker: SeekerUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<SeekerApplicationView>>> {
    let applications: Vec<SeekerApplicationView> = ApplicationRepository::new(db.pool())
        .list_for_seeker(seeker.id())
        .await?
        .into_iter()
        .map(|row| SeekerApplicationView {
            application: row.application,
            job_title: row.job_title,
        })
        .collect();

    Ok(Json(DataResponse::success(
        format!("{} application(s)", applications.len()),
        applications,
    )))
}

pub async fn applicants_handler(
    job_id: i64,
    admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<ApplicantView>>> {
    let job = load_owned_job(db, job_id, admin.id()).await?;
    let pairs = ApplicationRepository::new(db.pool())
        .list_with_seekers(job.id)
        .await?;

    let ranked: Vec<ApplicantView> = rank_applicants(&job, pairs)
        .into_iter()
        .map(|scored| ApplicantView {
            application: scored.application,
            seeker: scored.seeker,
            score: scored.score,
        })
        .collect();

    Ok(Json(DataResponse::success(
        format!("{} applicant(s) for \"{}\"", ranked.len(), job.title),
        ranked,
    )))
}

pub async fn update_status_handler(
    application_id: i64,
    request: Json<StatusUpdateRequest>,
    admin: AdminUser,
    db: &State<Database>,
    mail: &State<MailClient>,
    calendar: &State<CalendarClient>,
) -> ApiResult<DataResponse<StatusChangeData>> {
    if request.duration_minutes.is_some_and(|m| m <= 0) {
        return Err(ApiError::bad_request("duration_minutes must be positive"));
    }

    let workflow = ApplicationWorkflow::new(db.pool(), mail, calendar);
    let outcome = workflow
        .change_status(&StatusChangeRequest {
            application_id,
            admin_id: admin.id(),
            next: request.status,
            interview_at: request.interview_at,
            duration_minutes: request.duration_minutes,
        })
        .await
        .map_err(|e| match e {
            StatusChangeError::ApplicationNotFound => {
                ApiError::not_found(format!("Application {} not found", application_id))
            }
            StatusChangeError::NotJobOwner => ApiError::forbidden(e.to_string()),
            StatusChangeError::InvalidTransition { .. } => ApiError::new(
                Status::BadRequest,
                e.to_string(),
                "INVALID_TRANSITION",
            )
            .with_suggestion("Allowed: applied → shortlisted → interviewed → selected, or rejected before a final decision"),
            StatusChangeError::Conflict => ApiError::conflict(e.to_string()),
            StatusChangeError::Internal(cause) => ApiError::internal("Status change failed", cause),
        })?;

    let message = if outcome.warnings.is_empty() {
        format!("Application moved to {}", outcome.application.status)
    } else {
        format!(
            "Application moved to {} with {} warning(s)",
            outcome.application.status,
            outcome.warnings.len()
        )
    };

    Ok(Json(DataResponse::success(
        message,
        StatusChangeData {
            application: outcome.application,
            meeting_link: outcome.meeting_link,
            warnings: outcome.warnings,
        },
    )))
}

pub async fn update_score_handler(
    application_id: i64,
    request: Json<ScoreRequest>,
    admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Application>> {
    if !(0..=100).contains(&request.score) {
        return Err(ApiError::bad_request("Interview score must be between 0 and 100"));
    }

    let repo = ApplicationRepository::new(db.pool());
    let application = repo
        .find_by_id(application_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Application {} not found", application_id)))?;
    load_owned_job(db, application.job_id, admin.id()).await?;

    let application = repo
        .set_interview_score(application_id, request.score)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Application {} not found", application_id)))?;

    app_log!(info, "Admin {} scored application {} at {}", admin.id(), application_id, request.score);
    Ok(Json(DataResponse::success("Interview score saved", application)))
}
