// src/core/mod.rs
//! Core services: configuration, database, uploads and outbound API clients

pub mod calendar_client;
pub mod config_manager;
pub mod database;
pub mod fs_ops;
pub mod logging;
pub mod mail_client;
pub mod service_client;

pub use calendar_client::{CalendarClient, MeetingRequest};
pub use config_manager::ConfigManager;
pub use database::Database;
pub use fs_ops::FsOps;
pub use mail_client::{MailClient, MailOutcome, OutgoingMail};
pub use service_client::ServiceClient;
