//! Email repository: persistence and queries for message records.
//!
//! Uses SqlitePoolManager and the models (EmailRecord, DailyBucket,
//! ApplyOutcome). All counter and status mutations happen through atomic SQL
//! (increments and conditional updates), so concurrent events for the same
//! provider message id are linearizable at the store, including across
//! process instances.

use chrono::{DateTime, NaiveDate, Utc};
use mailflow_core::{DeliveryEvent, EmailStatus, EventKind, SendEmailRequest};
use tracing::info;

use crate::error::StorageError;
use crate::models::{ApplyOutcome, DailyBucket, EmailRecord};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct EmailRepository {
    pool_manager: SqlitePoolManager,
}

impl EmailRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS email_logs (
                id TEXT PRIMARY KEY,
                provider_message_id TEXT UNIQUE,
                sender TEXT NOT NULL,
                sender_name TEXT,
                recipients TEXT NOT NULL,
                cc TEXT,
                bcc TEXT,
                subject TEXT NOT NULL,
                status TEXT NOT NULL,
                is_success INTEGER NOT NULL DEFAULT 0,
                opens INTEGER NOT NULL DEFAULT 0,
                clicks INTEGER NOT NULL DEFAULT 0,
                bounces INTEGER NOT NULL DEFAULT 0,
                complaints INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notification_dedup (
                dedup_key TEXT PRIMARY KEY,
                provider_message_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                received_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_email_logs_created_at ON email_logs(created_at)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_email_logs_status ON email_logs(status)")
            .execute(pool)
            .await?;

        info!("Database tables created successfully");
        Ok(())
    }

    /// Persists the durable-intent row for a send request, before any provider
    /// contact. Returns the stored record.
    pub async fn create_pending(
        &self,
        request: &SendEmailRequest,
    ) -> Result<EmailRecord, StorageError> {
        let record = EmailRecord::pending(request)?;
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO email_logs (id, provider_message_id, sender, sender_name, recipients, cc, bcc,
                                    subject, status, is_success, opens, clicks, bounces, complaints,
                                    error_message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.provider_message_id)
        .bind(&record.sender)
        .bind(&record.sender_name)
        .bind(&record.recipients)
        .bind(&record.cc)
        .bind(&record.bcc)
        .bind(&record.subject)
        .bind(&record.status)
        .bind(record.is_success)
        .bind(record.opens)
        .bind(record.clicks)
        .bind(record.bounces)
        .bind(record.complaints)
        .bind(&record.error_message)
        .bind(record.created_at)
        .execute(pool)
        .await?;

        info!(record_id = %record.id, subject = %record.subject, "Created pending email record");
        Ok(record)
    }

    /// Marks a send accepted by the provider: status `Sent`, success flag set,
    /// provider message id stored. The `provider_message_id IS NULL` guard
    /// keeps the join key write-once.
    pub async fn finalize_sent(
        &self,
        id: &str,
        provider_message_id: &str,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE email_logs
            SET status = ?, is_success = 1, provider_message_id = ?
            WHERE id = ? AND provider_message_id IS NULL
            "#,
        )
        .bind(EmailStatus::Sent.as_str())
        .bind(provider_message_id)
        .bind(id)
        .execute(self.pool_manager.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "no finalizable record with id {id}"
            )));
        }

        info!(record_id = %id, provider_message_id = %provider_message_id, "Finalized record as Sent");
        Ok(())
    }

    /// Marks a send rejected by the provider: status `Failed`, error recorded.
    pub async fn finalize_failed(&self, id: &str, error_message: &str) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE email_logs
            SET status = ?, is_success = 0, error_message = ?
            WHERE id = ?
            "#,
        )
        .bind(EmailStatus::Failed.as_str())
        .bind(error_message)
        .bind(id)
        .execute(self.pool_manager.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("no record with id {id}")));
        }

        info!(record_id = %id, error = %error_message, "Finalized record as Failed");
        Ok(())
    }

    /// Applies one delivery event under the idempotency and ordering rules.
    ///
    /// Runs in a single transaction: the dedup-key insert detects redelivered
    /// notifications, counters move via atomic increments, and status changes
    /// are conditional updates encoding the partial order
    /// `Delivered < Bounced, Complaint` (the latter two never replace each
    /// other). A `NoMatch` rolls the dedup insert back so a redelivery after
    /// the record appears can still apply.
    pub async fn apply_event(&self, event: &DeliveryEvent) -> Result<ApplyOutcome, StorageError> {
        // Kinds with no effect are acknowledged without consuming the dedup key.
        if matches!(
            event.kind,
            EventKind::Send | EventKind::Reject | EventKind::Other(_)
        ) {
            return Ok(ApplyOutcome::Ignored);
        }

        let mut tx = self.pool_manager.pool().begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO notification_dedup (dedup_key, provider_message_id, event_type, received_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&event.dedup_key)
        .bind(&event.provider_message_id)
        .bind(event.kind.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Duplicate);
        }

        let matched: Option<(String,)> =
            sqlx::query_as("SELECT id FROM email_logs WHERE provider_message_id = ?")
                .bind(&event.provider_message_id)
                .fetch_optional(&mut *tx)
                .await?;

        if matched.is_none() {
            tx.rollback().await?;
            return Ok(ApplyOutcome::NoMatch);
        }

        let status_changed = match event.kind {
            EventKind::Bounce => {
                sqlx::query(
                    "UPDATE email_logs SET bounces = bounces + 1 WHERE provider_message_id = ?",
                )
                .bind(&event.provider_message_id)
                .execute(&mut *tx)
                .await?;

                let updated = sqlx::query(
                    r#"
                    UPDATE email_logs SET status = 'Bounced', is_success = 0
                    WHERE provider_message_id = ? AND status != 'Complaint'
                    "#,
                )
                .bind(&event.provider_message_id)
                .execute(&mut *tx)
                .await?;
                updated.rows_affected() > 0
            }
            EventKind::Complaint => {
                sqlx::query(
                    "UPDATE email_logs SET complaints = complaints + 1 WHERE provider_message_id = ?",
                )
                .bind(&event.provider_message_id)
                .execute(&mut *tx)
                .await?;

                let updated = sqlx::query(
                    r#"
                    UPDATE email_logs SET status = 'Complaint', is_success = 0
                    WHERE provider_message_id = ? AND status != 'Bounced'
                    "#,
                )
                .bind(&event.provider_message_id)
                .execute(&mut *tx)
                .await?;
                updated.rows_affected() > 0
            }
            EventKind::Delivery => {
                let updated = sqlx::query(
                    r#"
                    UPDATE email_logs SET status = 'Delivered', is_success = 1
                    WHERE provider_message_id = ? AND status NOT IN ('Bounced', 'Complaint')
                    "#,
                )
                .bind(&event.provider_message_id)
                .execute(&mut *tx)
                .await?;
                updated.rows_affected() > 0
            }
            EventKind::Open => {
                sqlx::query(
                    "UPDATE email_logs SET opens = opens + 1 WHERE provider_message_id = ?",
                )
                .bind(&event.provider_message_id)
                .execute(&mut *tx)
                .await?;
                false
            }
            EventKind::Click => {
                sqlx::query(
                    "UPDATE email_logs SET clicks = clicks + 1 WHERE provider_message_id = ?",
                )
                .bind(&event.provider_message_id)
                .execute(&mut *tx)
                .await?;
                false
            }
            EventKind::Send | EventKind::Reject | EventKind::Other(_) => false,
        };

        tx.commit().await?;

        info!(
            provider_message_id = %event.provider_message_id,
            event = %event.kind,
            status_changed,
            "Applied delivery event"
        );
        Ok(ApplyOutcome::Applied { status_changed })
    }

    /// Time-windowed rollups: one bucket per calendar day with at least one
    /// record in `[window_start, now]`, ascending by date. Pure read.
    pub async fn daily_metrics(
        &self,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<DailyBucket>, StorageError> {
        let rows: Vec<(String, i64, i64, i64, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT date(created_at) AS day,
                   COUNT(*),
                   COALESCE(SUM(CASE WHEN is_success THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'Bounced' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'Complaint' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(opens), 0),
                   COALESCE(SUM(clicks), 0)
            FROM email_logs
            WHERE created_at >= ?
            GROUP BY date(created_at)
            ORDER BY day ASC
            "#,
        )
        .bind(window_start)
        .fetch_all(self.pool_manager.pool())
        .await?;

        let mut buckets = Vec::with_capacity(rows.len());
        for (day, total, success, bounced, complaint, opens, clicks) in rows {
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| StorageError::Corrupt(format!("bucket day {day}: {e}")))?;
            buckets.push(DailyBucket {
                date,
                total,
                success_count: success,
                bounced_count: bounced,
                complaint_count: complaint,
                opens_sum: opens,
                clicks_sum: clicks,
            });
        }

        info!(buckets = buckets.len(), "Computed daily metrics");
        Ok(buckets)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<EmailRecord>, StorageError> {
        let record = sqlx::query_as::<_, EmailRecord>("SELECT * FROM email_logs WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(record)
    }

    pub async fn get_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<EmailRecord>, StorageError> {
        let record = sqlx::query_as::<_, EmailRecord>(
            "SELECT * FROM email_logs WHERE provider_message_id = ?",
        )
        .bind(provider_message_id)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(record)
    }
}
