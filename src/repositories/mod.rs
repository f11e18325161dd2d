// src/repositories/mod.rs
//! Raw parameterized SQL over the shared SQLite pool, one repository per table

pub mod applications;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod users;

pub use applications::ApplicationRepository;
pub use jobs::JobRepository;
pub use messages::MessageRepository;
pub use notifications::NotificationRepository;
pub use users::UserRepository;

/// True when `err` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
