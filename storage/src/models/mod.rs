mod apply_outcome;
mod daily_bucket;
mod email_record;

pub use apply_outcome::ApplyOutcome;
pub use daily_bucket::DailyBucket;
pub use email_record::EmailRecord;
