// src/matching.rs
//! Seeker/job match scoring and ranking

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Application, DisabilityStatus, Job, User};

/// Bonus awarded when seeker and job are both flagged PWD.
pub const DISABILITY_MATCH_WEIGHT: u32 = 1000;
pub const EDUCATION_MATCH_WEIGHT: u32 = 1;

/// The side of a match: either a seeker's profile or a job's requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchProfile {
    pub skills: Vec<String>,
    pub education: String,
    pub disability: DisabilityStatus,
}

#[derive(Debug, Clone)]
pub struct ScoredJob {
    pub job: Job,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct ScoredApplicant {
    pub application: Application,
    pub seeker: User,
    pub score: u32,
}

/// Split a comma-joined skills column into trimmed, lower-cased, distinct tags.
pub fn split_skills(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Join a skill list back into the stored comma-joined form.
pub fn join_skills<S: AsRef<str>>(skills: &[S]) -> String {
    skills
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

impl MatchProfile {
    pub fn new(skills: &str, education: &str, disability: DisabilityStatus) -> Self {
        Self {
            skills: split_skills(skills),
            education: education.trim().to_lowercase(),
            disability,
        }
    }

    pub fn of_seeker(user: &User) -> Self {
        Self::new(&user.skills, &user.education, user.disability_status)
    }

    pub fn of_job(job: &Job) -> Self {
        Self::new(&job.skills, &job.education, job.disability_status)
    }
}

pub fn match_score(seeker: &MatchProfile, job: &MatchProfile) -> u32 {
    let disability = if seeker.disability.is_pwd() && job.disability.is_pwd() {
        DISABILITY_MATCH_WEIGHT
    } else {
        0
    };

    let education = if !seeker.education.is_empty() && seeker.education == job.education {
        EDUCATION_MATCH_WEIGHT
    } else {
        0
    };

    let job_skills: HashSet<&str> = job.skills.iter().map(String::as_str).collect();
    let shared_skills = seeker
        .skills
        .iter()
        .filter(|s| job_skills.contains(s.as_str()))
        .count() as u32;

    disability + education + shared_skills
}

/// A PWD seeker is never offered a job flagged Non-PWD.
pub fn is_visible_to(seeker: &MatchProfile, job: &MatchProfile) -> bool {
    !(seeker.disability.is_pwd() && job.disability == DisabilityStatus::NonPwd)
}

/// Jobs worth showing a seeker: visible, non-zero score, best first.
/// Equal scores list the newest job first.
pub fn rank_jobs_for_seeker(seeker: &MatchProfile, jobs: Vec<Job>) -> Vec<ScoredJob> {
    let mut scored: Vec<ScoredJob> = jobs
        .into_iter()
        .filter_map(|job| {
            let profile = MatchProfile::of_job(&job);
            if !is_visible_to(seeker, &profile) {
                return None;
            }
            let score = match_score(seeker, &profile);
            (score > 0).then_some(ScoredJob { job, score })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.job.created_at.cmp(&a.job.created_at))
            .then_with(|| b.job.id.cmp(&a.job.id))
    });
    scored
}

/// Every applicant of `job`, best first. Equal scores keep the earliest application first.
pub fn rank_applicants(job: &Job, applicants: Vec<(Application, User)>) -> Vec<ScoredApplicant> {
    let job_profile = MatchProfile::of_job(job);

    let mut scored: Vec<ScoredApplicant> = applicants
        .into_iter()
        .map(|(application, seeker)| {
            let score = match_score(&MatchProfile::of_seeker(&seeker), &job_profile);
            ScoredApplicant {
                application,
                seeker,
                score,
            }
        })
        .collect();

    scored.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => a
            .application
            .applied_at
            .cmp(&b.application.applied_at)
            .then_with(|| a.application.id.cmp(&b.application.id)),
        other => other,
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ApplicationStatus;
    use crate::models::Role;
    use chrono::{Duration, Utc};
    use sqlx::types::Json;

    fn job(id: i64, skills: &str, education: &str, disability: DisabilityStatus) -> Job {
        Job {
            id,
            title: format!("Job {}", id),
            description: String::new(),
            education: education.to_string(),
            skills: skills.to_string(),
            employment_type: "Full-time".to_string(),
            disability_status: disability,
            admin_id: 1,
            created_at: Utc::now() + Duration::seconds(id),
        }
    }

    fn seeker(id: i64, skills: &str, education: &str, disability: DisabilityStatus) -> User {
        User {
            id,
            name: format!("Seeker {}", id),
            email: format!("s{}@example.com", id),
            password_hash: String::new(),
            role: Role::Seeker,
            education: education.to_string(),
            skills: skills.to_string(),
            disability_status: disability,
            is_verified: true,
            created_at: Utc::now(),
        }
    }

    fn application(id: i64, seeker_id: i64, minutes_ago: i64) -> Application {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Application {
            id,
            job_id: 1,
            seeker_id,
            status: ApplicationStatus::Applied,
            cover_note: None,
            document_urls: Json(vec![]),
            interview_score: None,
            meeting_link: None,
            applied_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_split_skills() {
        assert_eq!(split_skills("HTML, CSS ,node"), vec!["html", "css", "node"]);
        assert_eq!(split_skills(" , ,"), Vec::<String>::new());
        assert_eq!(split_skills("Rust, rust, RUST"), vec!["rust"]);
    }

    #[test]
    fn test_join_skills() {
        assert_eq!(join_skills(&[" HTML", "css ", ""]), "HTML, css");
    }

    #[test]
    fn test_non_pwd_example_scores_three() {
        let s = MatchProfile::new("html, css", "Bachelors Degree", DisabilityStatus::NonPwd);
        let j = MatchProfile::new("HTML, CSS, Node", "Bachelors Degree", DisabilityStatus::NonPwd);
        assert_eq!(match_score(&s, &j), 3);
    }

    #[test]
    fn test_pwd_example_scores_1003() {
        let s = MatchProfile::new("html, css", "Bachelors Degree", DisabilityStatus::Pwd);
        let j = MatchProfile::new("HTML, CSS, Node", "Bachelors Degree", DisabilityStatus::Pwd);
        assert_eq!(match_score(&s, &j), 1003);
    }

    #[test]
    fn test_education_is_case_insensitive_and_ignores_blank() {
        let s = MatchProfile::new("", "  bachelors degree ", DisabilityStatus::NonPwd);
        let j = MatchProfile::new("", "Bachelors Degree", DisabilityStatus::NonPwd);
        assert_eq!(match_score(&s, &j), 1);

        let blank = MatchProfile::new("", "", DisabilityStatus::NonPwd);
        assert_eq!(match_score(&blank, &blank), 0);
    }

    #[test]
    fn test_one_sided_pwd_gets_no_bonus() {
        let s = MatchProfile::new("go", "", DisabilityStatus::NonPwd);
        let j = MatchProfile::new("go", "", DisabilityStatus::Pwd);
        assert_eq!(match_score(&s, &j), 1);
    }

    #[test]
    fn test_score_monotonic_in_shared_skills() {
        let j = MatchProfile::new("a, b, c, d, e", "x", DisabilityStatus::NonPwd);
        let all = ["a", "b", "c", "d", "e"];
        let mut previous = None;
        for n in 0..=all.len() {
            let s = MatchProfile::new(&all[..n].join(","), "y", DisabilityStatus::NonPwd);
            let score = match_score(&s, &j);
            assert_eq!(score, n as u32);
            if let Some(prev) = previous {
                assert!(score > prev);
            }
            previous = Some(score);
        }
    }

    #[test]
    fn test_pwd_seeker_never_sees_non_pwd_job() {
        let s = seeker(1, "html, css", "BSc", DisabilityStatus::Pwd);
        let jobs = vec![
            job(1, "html, css", "BSc", DisabilityStatus::NonPwd),
            job(2, "html", "", DisabilityStatus::Pwd),
        ];
        let ranked = rank_jobs_for_seeker(&MatchProfile::of_seeker(&s), jobs);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].job.id, 2);
        assert_eq!(ranked[0].score, 1001);
    }

    #[test]
    fn test_non_pwd_seeker_sees_both_and_zero_scores_dropped() {
        let s = seeker(1, "rust", "", DisabilityStatus::NonPwd);
        let jobs = vec![
            job(1, "rust", "", DisabilityStatus::Pwd),
            job(2, "rust", "", DisabilityStatus::NonPwd),
            job(3, "java", "", DisabilityStatus::NonPwd),
        ];
        let ranked = rank_jobs_for_seeker(&MatchProfile::of_seeker(&s), jobs);
        let ids: Vec<i64> = ranked.iter().map(|r| r.job.id).collect();
        // equal scores: newest first
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_jobs_sorted_by_descending_score() {
        let s = seeker(1, "a, b, c", "", DisabilityStatus::NonPwd);
        let jobs = vec![
            job(1, "a", "", DisabilityStatus::NonPwd),
            job(2, "a, b, c", "", DisabilityStatus::NonPwd),
            job(3, "a, b", "", DisabilityStatus::NonPwd),
        ];
        let scores: Vec<u32> = rank_jobs_for_seeker(&MatchProfile::of_seeker(&s), jobs)
            .iter()
            .map(|r| r.score)
            .collect();
        assert_eq!(scores, vec![3, 2, 1]);
    }

    #[test]
    fn test_rank_applicants_keeps_everyone() {
        let j = job(1, "html, css", "BSc", DisabilityStatus::NonPwd);
        let applicants = vec![
            (application(10, 1, 30), seeker(1, "java", "", DisabilityStatus::Pwd)),
            (application(11, 2, 20), seeker(2, "html, css", "BSc", DisabilityStatus::NonPwd)),
            (application(12, 3, 10), seeker(3, "html", "", DisabilityStatus::NonPwd)),
            (application(13, 4, 40), seeker(4, "css", "", DisabilityStatus::NonPwd)),
        ];
        let ranked = rank_applicants(&j, applicants);
        let order: Vec<(i64, u32)> = ranked.iter().map(|r| (r.application.id, r.score)).collect();
        assert_eq!(order, vec![(11, 3), (13, 1), (12, 1), (10, 0)]);
    }
}
