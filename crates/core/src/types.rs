/// All primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (campaign ranges, delivery dates).
pub type Date = chrono::NaiveDate;
