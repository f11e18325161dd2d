// src/models.rs
//! Row types shared by repositories, services and handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;

use crate::lifecycle::ApplicationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Seeker,
    Admin,
}

/// Accessibility flag carried by seekers and jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum DisabilityStatus {
    #[serde(rename = "PWD", alias = "pwd")]
    #[sqlx(rename = "PWD")]
    Pwd,
    #[default]
    #[serde(rename = "Non-PWD", alias = "non-pwd", alias = "Non PWD", alias = "NON-PWD")]
    #[sqlx(rename = "Non-PWD")]
    NonPwd,
}

impl DisabilityStatus {
    pub fn is_pwd(self) -> bool {
        matches!(self, DisabilityStatus::Pwd)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Seeker => write!(f, "seeker"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "seeker" => Ok(Role::Seeker),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("Unknown role: {}", other),
        }
    }
}

impl fmt::Display for DisabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisabilityStatus::Pwd => write!(f, "PWD"),
            DisabilityStatus::NonPwd => write!(f, "Non-PWD"),
        }
    }
}

impl FromStr for DisabilityStatus {
    type Err = anyhow::Error;

    /// Accepts `PWD` / `Non-PWD` in any case, with `-`, space or nothing between words.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match folded.as_str() {
            "pwd" => Ok(DisabilityStatus::Pwd),
            "nonpwd" | "" => Ok(DisabilityStatus::NonPwd),
            _ => anyhow::bail!("Unknown disability status: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub education: String,
    pub skills: String,
    pub disability_status: DisabilityStatus,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub education: String,
    pub skills: String,
    pub employment_type: String,
    pub disability_status: DisabilityStatus,
    pub admin_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub seeker_id: i64,
    pub status: ApplicationStatus,
    pub cover_note: Option<String>,
    pub document_urls: Json<Vec<String>>,
    pub interview_score: Option<i64>,
    pub meeting_link: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disability_status_parsing() {
        assert_eq!("PWD".parse::<DisabilityStatus>().unwrap(), DisabilityStatus::Pwd);
        assert_eq!("pwd".parse::<DisabilityStatus>().unwrap(), DisabilityStatus::Pwd);
        assert_eq!(
            "Non-PWD".parse::<DisabilityStatus>().unwrap(),
            DisabilityStatus::NonPwd
        );
        assert_eq!(
            "non pwd".parse::<DisabilityStatus>().unwrap(),
            DisabilityStatus::NonPwd
        );
        assert!("maybe".parse::<DisabilityStatus>().is_err());
    }

    #[test]
    fn test_disability_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&DisabilityStatus::NonPwd).unwrap(),
            "\"Non-PWD\""
        );
        let parsed: DisabilityStatus = serde_json::from_str("\"pwd\"").unwrap();
        assert_eq!(parsed, DisabilityStatus::Pwd);
    }

    #[test]
    fn test_role_round_trips_through_display() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Seeker.to_string(), "seeker");
    }
}
