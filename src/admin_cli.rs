// src/admin_cli.rs
use crate::app_log;
use crate::auth::AuthConfig;
use crate::core::{ConfigManager, Database};
use crate::models::{DisabilityStatus, Role, User};
use crate::repositories::jobs::NewJob;
use crate::repositories::users::NewUser;
use crate::repositories::{JobRepository, UserRepository};
use crate::utils::{is_valid_email, normalize_text, MIN_PASSWORD_CHARS};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Job board API server and administration commands")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<AdminCommand>,

    /// Configuration file (defaults to $JOBBOARD_CONFIG or config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Start the HTTP server (default)
    Serve,
    /// Create the database and run migrations
    Init,
    /// Create an admin account
    CreateAdmin {
        email: String,
        name: String,
        password: String,
    },
    /// List accounts, optionally filtered by role (seeker or admin)
    ListUsers {
        #[arg(long)]
        role: Option<String>,
    },
    /// Import jobs from a CSV file owned by the given admin
    ImportJobs {
        csv_file: PathBuf,
        #[arg(long)]
        admin_email: String,
    },
}

#[derive(Debug, Deserialize)]
struct JobRow {
    title: String,
    description: String,
    #[serde(default)]
    education: String,
    #[serde(default)]
    skills: String,
    #[serde(default)]
    employment_type: String,
    #[serde(default)]
    disability_status: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

pub async fn handle_admin_command(command: AdminCommand, config: ConfigManager) -> Result<()> {
    match command {
        AdminCommand::Serve => return crate::start_web_server(config).await,

        AdminCommand::Init => {
            Database::new(&config.storage.database_path).await?;
            app_log!(
                info,
                "✅ Database initialized at: {}",
                config.storage.database_path.display()
            );
            app_log!(info, "   Tables: users, jobs, applications, notifications, messages");
        }

        AdminCommand::CreateAdmin {
            email,
            name,
            password,
        } => {
            let db = Database::new(&config.storage.database_path).await?;
            let auth = AuthConfig::from_config(&config);
            let admin = create_admin(&db, &auth, &email, &name, &password).await?;
            app_log!(info, "✅ Admin created successfully:");
            app_log!(info, "   Email: {}", admin.email);
            app_log!(info, "   ID: {}", admin.id);
        }

        AdminCommand::ListUsers { role } => {
            let role = role.as_deref().map(str::parse::<Role>).transpose()?;
            let db = Database::new(&config.storage.database_path).await?;
            let users = UserRepository::new(db.pool()).list(role).await?;

            if users.is_empty() {
                app_log!(info, "No users found.");
            } else {
                app_log!(
                    info,
                    "{:<5} {:<30} {:<20} {:<8} {:<9} {:<20}",
                    "ID",
                    "Email",
                    "Name",
                    "Role",
                    "Verified",
                    "Created"
                );
                app_log!(info, "{}", "-".repeat(95));
                for user in users {
                    app_log!(
                        info,
                        "{:<5} {:<30} {:<20} {:<8} {:<9} {:<20}",
                        user.id,
                        user.email,
                        user.name,
                        user.role,
                        if user.is_verified { "yes" } else { "no" },
                        user.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }

        AdminCommand::ImportJobs {
            csv_file,
            admin_email,
        } => {
            let db = Database::new(&config.storage.database_path).await?;
            let admin = UserRepository::new(db.pool())
                .find_by_email(&admin_email)
                .await?
                .filter(|u| u.role == Role::Admin)
                .with_context(|| format!("No admin account for {}", admin_email))?;

            let content = tokio::fs::read_to_string(&csv_file)
                .await
                .with_context(|| format!("CSV file not found: {}", csv_file.display()))?;

            let report = import_jobs(&db, content.as_bytes(), admin.id).await?;
            app_log!(info, "Import completed:");
            app_log!(info, "  ✅ Imported: {}", report.imported);
            app_log!(info, "  ❌ Skipped:  {}", report.skipped);
        }
    }

    Ok(())
}

pub async fn create_admin(
    db: &Database,
    auth: &AuthConfig,
    email: &str,
    name: &str,
    password: &str,
) -> Result<User> {
    let email = email.trim().to_lowercase();
    let name = normalize_text(name);

    if !is_valid_email(&email) {
        anyhow::bail!("Invalid email address: {}", email);
    }
    if name.is_empty() {
        anyhow::bail!("Name cannot be empty");
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        anyhow::bail!("Password must be at least {} characters", MIN_PASSWORD_CHARS);
    }

    UserRepository::new(db.pool())
        .create(&NewUser {
            name,
            email: email.clone(),
            password_hash: auth.hash_password(password)?,
            role: Role::Admin,
            education: String::new(),
            skills: String::new(),
            disability_status: DisabilityStatus::NonPwd,
            is_verified: true,
        })
        .await?
        .with_context(|| format!("Email '{}' already exists", email))
}

/// Create one job per CSV record (`title,description,education,skills,employment_type,disability_status`).
/// Bad records are logged and skipped.
pub async fn import_jobs<R: std::io::Read>(db: &Database, source: R, admin_id: i64) -> Result<ImportReport> {
    let repo = JobRepository::new(db.pool());
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
    let mut report = ImportReport::default();

    for (line, result) in reader.deserialize::<JobRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                report.skipped += 1;
                app_log!(warn, "⚠️  Row {}: CSV parsing error: {}", line + 1, e);
                continue;
            }
        };

        if row.title.is_empty() || row.description.is_empty() {
            report.skipped += 1;
            app_log!(warn, "⚠️  Row {}: skipping empty title or description", line + 1);
            continue;
        }

        let disability_status = match row.disability_status.parse::<DisabilityStatus>() {
            Ok(status) => status,
            Err(e) => {
                report.skipped += 1;
                app_log!(warn, "⚠️  Row {}: {}", line + 1, e);
                continue;
            }
        };

        let job = repo
            .create(&NewJob {
                title: normalize_text(&row.title),
                description: row.description,
                education: normalize_text(&row.education),
                skills: row.skills,
                employment_type: normalize_text(&row.employment_type),
                disability_status,
                admin_id,
            })
            .await?;
        report.imported += 1;
        app_log!(info, "✅ Added job {}: {}", job.id, job.title);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig::new("cli-test-secret-value", 1, 1, 4)
    }

    #[tokio::test]
    async fn test_create_admin_rejects_duplicates() {
        let db = Database::in_memory().await.unwrap();
        let admin = create_admin(&db, &auth(), "Boss@Example.com", "The Boss", "longenough")
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.email, "boss@example.com");
        assert!(admin.is_verified);
        assert!(auth().verify_password("longenough", &admin.password_hash));

        assert!(create_admin(&db, &auth(), "boss@example.com", "Again", "longenough")
            .await
            .is_err());
        assert!(create_admin(&db, &auth(), "short@example.com", "Short", "abc")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_import_jobs_skips_bad_rows() {
        let db = Database::in_memory().await.unwrap();
        let admin = create_admin(&db, &auth(), "hr@example.com", "HR", "longenough")
            .await
            .unwrap();

        let csv = "\
title,description,education,skills,employment_type,disability_status
Web Developer,Build pages,Bachelors Degree,\"HTML, CSS, Node\",Full-time,Non-PWD
Accessible Support,Help customers,Diploma,communication,Part-time,PWD
,No title,,,,
Tester,Break things,,qa,Contract,maybe
";
        let report = import_jobs(&db, csv.as_bytes(), admin.id).await.unwrap();
        assert_eq!(report, ImportReport { imported: 2, skipped: 2 });

        let jobs = JobRepository::new(db.pool()).list_all().await.unwrap();
        assert_eq!(jobs.len(), 2);
        let support = jobs.iter().find(|j| j.title == "Accessible Support").unwrap();
        assert_eq!(support.disability_status, DisabilityStatus::Pwd);
        let web = jobs.iter().find(|j| j.title == "Web Developer").unwrap();
        assert_eq!(web.skills, "HTML, CSS, Node");
    }
}
