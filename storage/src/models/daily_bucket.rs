//! One calendar day of send/engagement rollups.
//!
//! Returned by EmailRepository::daily_metrics; days without records are
//! omitted, not zero-filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    /// All records created that day.
    pub total: i64,
    pub success_count: i64,
    pub bounced_count: i64,
    pub complaint_count: i64,
    pub opens_sum: i64,
    pub clicks_sum: i64,
}
