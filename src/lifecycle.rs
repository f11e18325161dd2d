// src/lifecycle.rs
//! Application status machine and the admin-driven status change workflow

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;

use crate::app_log;
use crate::core::{CalendarClient, MailClient, MeetingRequest, OutgoingMail};
use crate::models::{Application, Job, User};
use crate::repositories::{
    ApplicationRepository, JobRepository, NotificationRepository, UserRepository,
};

pub const DEFAULT_INTERVIEW_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Interviewed,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Selected | ApplicationStatus::Rejected)
    }

    /// `applied → shortlisted → interviewed → selected`, and `rejected` from any non-terminal state.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, next) {
            (from, Rejected) => !from.is_terminal(),
            (Applied, Shortlisted) | (Shortlisted, Interviewed) | (Interviewed, Selected) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Selected => "selected",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "applied" => Ok(ApplicationStatus::Applied),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "interviewed" => Ok(ApplicationStatus::Interviewed),
            "selected" => Ok(ApplicationStatus::Selected),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => anyhow::bail!("Unknown application status: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusChangeRequest {
    pub application_id: i64,
    pub admin_id: i64,
    pub next: ApplicationStatus,
    pub interview_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct StatusChangeOutcome {
    pub application: Application,
    pub job: Job,
    pub seeker: User,
    pub meeting_link: Option<String>,
    /// Side effects that failed after the status was committed
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub enum StatusChangeError {
    ApplicationNotFound,
    NotJobOwner,
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    /// Someone else changed the application between read and write
    Conflict,
    Internal(anyhow::Error),
}

impl fmt::Display for StatusChangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusChangeError::ApplicationNotFound => write!(f, "application not found"),
            StatusChangeError::NotJobOwner => write!(f, "only the job owner can change this application"),
            StatusChangeError::InvalidTransition { from, to } => {
                write!(f, "cannot move an application from {} to {}", from, to)
            }
            StatusChangeError::Conflict => {
                write!(f, "application was modified concurrently, reload and retry")
            }
            StatusChangeError::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for StatusChangeError {}

impl From<anyhow::Error> for StatusChangeError {
    fn from(e: anyhow::Error) -> Self {
        StatusChangeError::Internal(e)
    }
}

impl From<sqlx::Error> for StatusChangeError {
    fn from(e: sqlx::Error) -> Self {
        StatusChangeError::Internal(e.into())
    }
}

pub fn notification_text(job_title: &str, status: ApplicationStatus) -> String {
    match status {
        ApplicationStatus::Applied => format!("Your application for \"{}\" was received.", job_title),
        ApplicationStatus::Shortlisted => format!(
            "You have been shortlisted for \"{}\". Check your email for interview details.",
            job_title
        ),
        ApplicationStatus::Interviewed => {
            format!("Your interview for \"{}\" has been recorded.", job_title)
        }
        ApplicationStatus::Selected => {
            format!("Congratulations! You were selected for \"{}\".", job_title)
        }
        ApplicationStatus::Rejected => format!(
            "Your application for \"{}\" was not successful this time.",
            job_title
        ),
    }
}

pub struct ApplicationWorkflow<'a> {
    pool: &'a SqlitePool,
    mail: &'a MailClient,
    calendar: &'a CalendarClient,
}

impl<'a> ApplicationWorkflow<'a> {
    pub fn new(pool: &'a SqlitePool, mail: &'a MailClient, calendar: &'a CalendarClient) -> Self {
        Self {
            pool,
            mail,
            calendar,
        }
    }

    /// Validate and commit a status change together with the seeker's notification,
    /// then run the calendar and email side effects.
    pub async fn change_status(
        &self,
        request: &StatusChangeRequest,
    ) -> Result<StatusChangeOutcome, StatusChangeError> {
        let applications = ApplicationRepository::new(self.pool);

        let application = applications
            .find_by_id(request.application_id)
            .await?
            .ok_or(StatusChangeError::ApplicationNotFound)?;

        let job = JobRepository::new(self.pool)
            .find_by_id(application.job_id)
            .await?
            .context("application references a missing job")?;
        if job.admin_id != request.admin_id {
            return Err(StatusChangeError::NotJobOwner);
        }

        let from = application.status;
        if !from.can_transition_to(request.next) {
            return Err(StatusChangeError::InvalidTransition {
                from,
                to: request.next,
            });
        }

        let seeker = UserRepository::new(self.pool)
            .find_by_id(application.seeker_id)
            .await?
            .context("application references a missing seeker")?;

        self.commit_transition(&application, &job, &seeker, request.next)
            .await?;

        app_log!(
            info,
            "Application {} moved {} -> {} by admin {}",
            application.id,
            from,
            request.next,
            request.admin_id
        );

        let mut warnings = Vec::new();
        let mut meeting_link = None;

        if request.next == ApplicationStatus::Shortlisted {
            match self.schedule_interview(request, &job, &seeker).await {
                Ok(Some(link)) => {
                    if let Err(e) = applications.set_meeting_link(application.id, &link).await {
                        app_log!(error, "Failed to store meeting link for {}: {}", application.id, e);
                        warnings.push("Meeting created but its link could not be saved".to_string());
                    }
                    meeting_link = Some(link);
                }
                Ok(None) => {}
                Err(e) => {
                    app_log!(error, "Calendar invite failed for application {}: {}", application.id, e);
                    warnings.push("Interview meeting could not be created".to_string());
                }
            }
        }

        let mail = OutgoingMail::status_update(
            &seeker.email,
            &seeker.name,
            &job.title,
            request.next,
            meeting_link.as_deref(),
        );
        if let Err(e) = self.mail.send(&mail).await {
            app_log!(error, "Status email to {} failed: {}", seeker.email, e);
            warnings.push("Email notification could not be sent".to_string());
        }

        let application = applications
            .find_by_id(application.id)
            .await?
            .ok_or(StatusChangeError::ApplicationNotFound)?;

        Ok(StatusChangeOutcome {
            application,
            job,
            seeker,
            meeting_link,
            warnings,
        })
    }

    /// Move `application` out of the status it was read in and notify the seeker,
    /// all or nothing. `Conflict` when the row no longer holds that status.
    async fn commit_transition(
        &self,
        application: &Application,
        job: &Job,
        seeker: &User,
        next: ApplicationStatus,
    ) -> Result<(), StatusChangeError> {
        let from = application.status;
        let mut tx = self.pool.begin().await?;
        let moved =
            ApplicationRepository::transition_status(&mut tx, application.id, from, next).await?;
        if !moved {
            tx.rollback().await?;
            app_log!(
                warn,
                "Application {} changed concurrently, refusing {} -> {}",
                application.id,
                from,
                next
            );
            return Err(StatusChangeError::Conflict);
        }
        NotificationRepository::create_in(&mut tx, seeker.id, &notification_text(&job.title, next))
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn schedule_interview(
        &self,
        request: &StatusChangeRequest,
        job: &Job,
        seeker: &User,
    ) -> anyhow::Result<Option<String>> {
        let start = request
            .interview_at
            .unwrap_or_else(|| Utc::now() + Duration::days(1));
        let minutes = request
            .duration_minutes
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_INTERVIEW_MINUTES);

        self.calendar
            .create_meeting(&MeetingRequest {
                summary: format!("Interview: {}", job.title),
                description: format!("Interview with {} for the {} position", seeker.name, job.title),
                attendee_email: seeker.email.clone(),
                start,
                end: start + Duration::minutes(minutes),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_manager::{CalendarSettings, MailSettings};
    use crate::core::Database;
    use crate::models::Role;
    use crate::test_support;
    use ApplicationStatus::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(Applied.can_transition_to(Shortlisted));
        assert!(Shortlisted.can_transition_to(Interviewed));
        assert!(Interviewed.can_transition_to(Selected));
        for from in [Applied, Shortlisted, Interviewed] {
            assert!(from.can_transition_to(Rejected), "{} -> rejected", from);
        }
    }

    #[test]
    fn test_refused_transitions() {
        assert!(!Applied.can_transition_to(Interviewed));
        assert!(!Applied.can_transition_to(Selected));
        assert!(!Shortlisted.can_transition_to(Applied));
        assert!(!Applied.can_transition_to(Applied));
        for to in [Applied, Shortlisted, Interviewed, Selected, Rejected] {
            assert!(!Selected.can_transition_to(to));
            assert!(!Rejected.can_transition_to(to));
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Shortlisted".parse::<ApplicationStatus>().unwrap(), Shortlisted);
        assert!("hired".parse::<ApplicationStatus>().is_err());
        assert_eq!(serde_json::to_string(&Interviewed).unwrap(), "\"interviewed\"");
    }

    struct Fixture {
        db: Database,
        mail: MailClient,
        calendar: CalendarClient,
        admin: User,
        application: Application,
    }

    async fn fixture() -> Fixture {
        fixture_with(MailSettings::default(), CalendarSettings::default()).await
    }

    async fn fixture_with(mail: MailSettings, calendar: CalendarSettings) -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let admin = test_support::user(&db, "admin@x.io", Role::Admin, "").await;
        let seeker = test_support::user(&db, "s@x.io", Role::Seeker, "rust").await;
        let job = test_support::job(&db, admin.id, "Backend", "rust").await;
        let application = ApplicationRepository::new(db.pool())
            .create(job.id, seeker.id, None, &[])
            .await
            .unwrap()
            .unwrap();
        Fixture {
            db,
            mail: MailClient::new(&mail).unwrap(),
            calendar: CalendarClient::new(&calendar).unwrap(),
            admin,
            application,
        }
    }

    /// Mail and calendar enabled against `base_url`
    fn enabled_services(base_url: &str) -> (MailSettings, CalendarSettings) {
        let mail = MailSettings {
            base_url: base_url.to_string(),
            api_key: Some("mail-key".to_string()),
            timeout_seconds: 5,
            ..MailSettings::default()
        };
        let calendar = CalendarSettings {
            base_url: base_url.to_string(),
            api_token: Some("calendar-token".to_string()),
            timeout_seconds: 5,
            ..CalendarSettings::default()
        };
        (mail, calendar)
    }

    fn request(f: &Fixture, next: ApplicationStatus) -> StatusChangeRequest {
        StatusChangeRequest {
            application_id: f.application.id,
            admin_id: f.admin.id,
            next,
            interview_at: None,
            duration_minutes: None,
        }
    }

    #[tokio::test]
    async fn test_full_path_to_selected_notifies_each_step() {
        let f = fixture().await;
        let workflow = ApplicationWorkflow::new(f.db.pool(), &f.mail, &f.calendar);

        for next in [Shortlisted, Interviewed, Selected] {
            let outcome = workflow.change_status(&request(&f, next)).await.unwrap();
            assert_eq!(outcome.application.status, next);
            assert!(outcome.warnings.is_empty());
            assert_eq!(outcome.meeting_link, None);
        }

        let notes = NotificationRepository::new(f.db.pool())
            .list_for_user(f.application.seeker_id)
            .await
            .unwrap();
        assert_eq!(notes.len(), 3);
        assert!(notes[0].message.contains("selected"));
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_row_untouched() {
        let f = fixture().await;
        let workflow = ApplicationWorkflow::new(f.db.pool(), &f.mail, &f.calendar);

        let err = workflow
            .change_status(&request(&f, Selected))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StatusChangeError::InvalidTransition {
                from: Applied,
                to: Selected
            }
        ));

        let unread = NotificationRepository::new(f.db.pool())
            .unread_count(f.application.seeker_id)
            .await
            .unwrap();
        assert_eq!(unread, 0);
    }

    #[tokio::test]
    async fn test_rejected_is_terminal() {
        let f = fixture().await;
        let workflow = ApplicationWorkflow::new(f.db.pool(), &f.mail, &f.calendar);

        workflow.change_status(&request(&f, Rejected)).await.unwrap();
        let err = workflow
            .change_status(&request(&f, Shortlisted))
            .await
            .unwrap_err();
        assert!(matches!(err, StatusChangeError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_other_admin_cannot_change_status() {
        let f = fixture().await;
        let other = test_support::user(&f.db, "other@x.io", Role::Admin, "").await;
        let workflow = ApplicationWorkflow::new(f.db.pool(), &f.mail, &f.calendar);

        let mut req = request(&f, Shortlisted);
        req.admin_id = other.id;
        assert!(matches!(
            workflow.change_status(&req).await.unwrap_err(),
            StatusChangeError::NotJobOwner
        ));

        req.application_id = 9999;
        assert!(matches!(
            workflow.change_status(&req).await.unwrap_err(),
            StatusChangeError::ApplicationNotFound
        ));
    }

    #[tokio::test]
    async fn test_unreachable_services_still_commit_with_warnings() {
        let (mail, calendar) = enabled_services("http://127.0.0.1:1");
        let f = fixture_with(mail, calendar).await;
        let workflow = ApplicationWorkflow::new(f.db.pool(), &f.mail, &f.calendar);

        let outcome = workflow
            .change_status(&request(&f, Shortlisted))
            .await
            .unwrap();
        assert_eq!(outcome.application.status, Shortlisted);
        assert_eq!(outcome.meeting_link, None);
        assert_eq!(
            outcome.warnings,
            vec![
                "Interview meeting could not be created".to_string(),
                "Email notification could not be sent".to_string(),
            ]
        );

        let notes = NotificationRepository::new(f.db.pool())
            .list_for_user(f.application.seeker_id)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("shortlisted"));
    }

    #[tokio::test]
    async fn test_shortlist_stores_meeting_link() {
        let base_url = test_support::json_endpoint(
            r#"{"id":"evt-1","hangoutLink":"https://meet.example.com/abc-defg-hij","messageId":"<m1@mail>"}"#,
        )
        .await;
        let (mail, calendar) = enabled_services(&base_url);
        let f = fixture_with(mail, calendar).await;
        let workflow = ApplicationWorkflow::new(f.db.pool(), &f.mail, &f.calendar);

        let mut req = request(&f, Shortlisted);
        req.interview_at = Some(Utc::now() + Duration::days(2));
        req.duration_minutes = Some(45);
        let outcome = workflow.change_status(&req).await.unwrap();

        let link = "https://meet.example.com/abc-defg-hij";
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.meeting_link.as_deref(), Some(link));
        assert_eq!(outcome.application.meeting_link.as_deref(), Some(link));

        let stored = ApplicationRepository::new(f.db.pool())
            .find_by_id(f.application.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.meeting_link.as_deref(), Some(link));
    }

    #[tokio::test]
    async fn test_stale_read_conflicts_without_notifying() {
        let f = fixture().await;
        let job = JobRepository::new(f.db.pool())
            .find_by_id(f.application.job_id)
            .await
            .unwrap()
            .unwrap();
        let seeker = UserRepository::new(f.db.pool())
            .find_by_id(f.application.seeker_id)
            .await
            .unwrap()
            .unwrap();

        // another admin action lands between the read and the write
        {
            let mut conn = f.db.pool().acquire().await.unwrap();
            assert!(ApplicationRepository::transition_status(
                &mut conn,
                f.application.id,
                Applied,
                Rejected
            )
            .await
            .unwrap());
        }

        let workflow = ApplicationWorkflow::new(f.db.pool(), &f.mail, &f.calendar);
        let err = workflow
            .commit_transition(&f.application, &job, &seeker, Shortlisted)
            .await
            .unwrap_err();
        assert!(matches!(err, StatusChangeError::Conflict));

        let stored = ApplicationRepository::new(f.db.pool())
            .find_by_id(f.application.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, Rejected);
        let notes = NotificationRepository::new(f.db.pool())
            .list_for_user(seeker.id)
            .await
            .unwrap();
        assert!(notes.is_empty());
    }
}
