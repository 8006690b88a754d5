use time::OffsetDateTime;

/// Soft-delete state of a stored record.
///
/// Postgres keeps this as a nullable `deleted_at` column; stores filter on it
/// so nothing above the storage boundary ever sees a deleted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Deleted(OffsetDateTime),
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Deleting twice keeps the first timestamp.
    pub fn delete(&mut self, at: OffsetDateTime) {
        if self.is_active() {
            *self = Self::Deleted(at);
        }
    }
}

/// Current UTC time truncated to the microsecond precision Postgres stores.
pub fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_microsecond(now.microsecond()).unwrap_or(now)
}
