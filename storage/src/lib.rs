//! Storage crate: message-record persistence for the email service.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – EmailRecord, DailyBucket, ApplyOutcome
//! - [`email_repo`] – EmailRepository (SQLite)
//! - [`sqlite_pool`] – SqlitePoolManager

mod email_repo;
mod error;
mod models;
mod sqlite_pool;


pub use email_repo::EmailRepository;
pub use error::StorageError;
pub use models::{ApplyOutcome, DailyBucket, EmailRecord};
pub use sqlite_pool::SqlitePoolManager;
