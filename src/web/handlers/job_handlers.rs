// src/web/handlers/job_handlers.rs
use crate::app_log;
use crate::auth::{AdminUser, SeekerUser};
use crate::core::Database;
use crate::matching::{rank_jobs_for_seeker, MatchProfile};
use crate::models::Job;
use crate::repositories::jobs::{DeleteOutcome, JobUpdate, NewJob};
use crate::repositories::JobRepository;
use crate::utils::normalize_text;
use crate::web::types::*;

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;

/// Fetch a job the calling admin owns: 404 when missing, 403 when someone else's
pub(crate) async fn load_owned_job(db: &Database, job_id: i64, admin_id: i64) -> Result<Job, ApiError> {
    let job = JobRepository::new(db.pool())
        .find_by_id(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", job_id)))?;

    if job.admin_id != admin_id {
        app_log!(warn, "Admin {} touched job {} owned by {}", admin_id, job_id, job.admin_id);
        return Err(ApiError::forbidden("You can only manage jobs you posted"));
    }
    Ok(job)
}

pub async fn list_jobs_handler(db: &State<Database>) -> ApiResult<DataResponse<Vec<Job>>> {
    let jobs = JobRepository::new(db.pool()).list_all().await?;
    Ok(Json(DataResponse::success(format!("{} job(s)", jobs.len()), jobs)))
}

pub async fn get_job_handler(id: i64, db: &State<Database>) -> ApiResult<DataResponse<Job>> {
    let job = JobRepository::new(db.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", id)))?;
    Ok(Json(DataResponse::success("Job", job)))
}

pub async fn create_job_handler(
    request: Json<CreateJobRequest>,
    admin: AdminUser,
    db: &State<Database>,
) -> Result<Custom<Json<DataResponse<Job>>>, ApiError> {
    let request = request.into_inner();
    let title = normalize_text(&request.title);
    let description = request.description.trim().to_string();

    if title.is_empty() || description.is_empty() {
        return Err(ApiError::bad_request("Title and description are required"));
    }

    let job = JobRepository::new(db.pool())
        .create(&NewJob {
            title,
            description,
            education: normalize_text(&request.education),
            skills: request.skills.map(SkillsInput::into_stored).unwrap_or_default(),
            employment_type: normalize_text(&request.employment_type),
            disability_status: request.disability_status,
            admin_id: admin.id(),
        })
        .await?;

    Ok(Custom(
        Status::Created,
        Json(DataResponse::success("Job posted", job)),
    ))
}

pub async fn update_job_handler(
    id: i64,
    request: Json<UpdateJobRequest>,
    admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Job>> {
    load_owned_job(db, id, admin.id()).await?;
    let request = request.into_inner();

    let title = request.title.map(|t| normalize_text(&t));
    let description = request.description.map(|d| d.trim().to_string());
    if title.as_deref() == Some("") || description.as_deref() == Some("") {
        return Err(ApiError::bad_request("Title and description cannot be empty"));
    }

    let update = JobUpdate {
        title,
        description,
        education: request.education.map(|e| normalize_text(&e)),
        skills: request.skills.map(SkillsInput::into_stored),
        employment_type: request.employment_type.map(|e| normalize_text(&e)),
        disability_status: request.disability_status,
    };

    let job = JobRepository::new(db.pool())
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", id)))?;

    app_log!(info, "Admin {} updated job {}", admin.id(), id);
    Ok(Json(DataResponse::success("Job updated", job)))
}

pub async fn delete_job_handler(
    id: i64,
    admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<ActionResponse> {
    load_owned_job(db, id, admin.id()).await?;

    match JobRepository::new(db.pool()).delete_if_unused(id).await? {
        DeleteOutcome::Deleted => Ok(Json(ActionResponse::success(
            format!("Job {} deleted", id),
            "deleted",
        ))),
        DeleteOutcome::HasApplicants(count) => Err(ApiError::conflict(format!(
            "Job {} has {} application(s) and cannot be deleted",
            id, count
        ))
        .with_suggestion("Reject the applicants instead")),
        DeleteOutcome::NotFound => Err(ApiError::not_found(format!("Job {} not found", id))),
    }
}

pub async fn matching_jobs_handler(
    seeker: SeekerUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<MatchedJob>>> {
    let jobs = JobRepository::new(db.pool()).list_all().await?;
    let profile = MatchProfile::of_seeker(seeker.user());

    let matched: Vec<MatchedJob> = rank_jobs_for_seeker(&profile, jobs)
        .into_iter()
        .map(|scored| MatchedJob {
            job: scored.job,
            score: scored.score,
        })
        .collect();

    app_log!(debug, "{} matching job(s) for {}", matched.len(), seeker.email());
    Ok(Json(DataResponse::success(
        format!("{} matching job(s)", matched.len()),
        matched,
    )))
}

pub async fn my_jobs_handler(
    admin: AdminUser,
    db: &State<Database>,
) -> ApiResult<DataResponse<Vec<AdminJob>>> {
    let jobs: Vec<AdminJob> = JobRepository::new(db.pool())
        .list_by_admin(admin.id())
        .await?
        .into_iter()
        .map(|row| AdminJob {
            job: row.job,
            applicant_count: row.applicant_count,
        })
        .collect();

    Ok(Json(DataResponse::success(format!("{} job(s)", jobs.len()), jobs)))
}
