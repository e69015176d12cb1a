/// All primary keys are service-generated UUIDs (v7, time-ordered).
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a new primary key.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}
