use serde::Deserialize;
use time::{Date, OffsetDateTime, Time};

use crate::error::{ServiceError, ServiceResult};

/// 1-indexed page request; offset = (page - 1) * limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Pages below 1 are read as the first page.
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.max(0)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// A zero limit asks for an empty page, never for "all rows".
    pub fn is_empty(&self) -> bool {
        self.limit() == 0
    }

    /// Applies the window to an already ordered slice.
    pub fn window<T: Clone>(&self, rows: &[T]) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(0);
        rows.iter().skip(offset).take(limit).cloned().collect()
    }
}

/// Calendar-date range; both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
    after: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> ServiceResult<Self> {
        if end < start {
            return Err(ServiceError::Validation(format!(
                "end_date {end} is before start_date {start}"
            )));
        }
        let after = end.next_day().ok_or_else(|| {
            ServiceError::Validation(format!("end_date {end} is past the last supported date"))
        })?;
        Ok(Self { start, end, after })
    }

    /// First instant inside the range.
    pub fn starts_at(&self) -> OffsetDateTime {
        self.start.with_time(Time::MIDNIGHT).assume_utc()
    }

    /// First instant after the range (exclusive bound).
    pub fn ends_before(&self) -> OffsetDateTime {
        self.after.with_time(Time::MIDNIGHT).assume_utc()
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        at >= self.starts_at() && at < self.ends_before()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn offset_is_one_indexed() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(3, 10).offset(), 20);
        assert_eq!(Pagination::new(0, 10).offset(), 0);
        assert_eq!(Pagination::new(-4, 10).page(), 1);
    }

    #[test]
    fn window_matches_offset_and_limit() {
        let rows: Vec<i32> = (0..25).collect();
        assert_eq!(Pagination::new(1, 10).window(&rows), (0..10).collect::<Vec<_>>());
        assert_eq!(Pagination::new(3, 10).window(&rows), (20..25).collect::<Vec<_>>());
        assert!(Pagination::new(4, 10).window(&rows).is_empty());
    }

    #[test]
    fn zero_limit_is_an_empty_page() {
        let rows: Vec<i32> = (0..5).collect();
        let p = Pagination::new(1, 0);
        assert!(p.is_empty());
        assert!(p.window(&rows).is_empty());
        assert!(Pagination::new(2, -3).window(&rows).is_empty());
    }

    #[test]
    fn date_range_covers_whole_end_day() {
        let range = DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 31)).unwrap();
        assert!(range.contains(datetime!(2024-01-01 0:00 UTC)));
        assert!(range.contains(datetime!(2024-01-31 23:59:59 UTC)));
        assert!(!range.contains(datetime!(2024-02-01 0:00 UTC)));
        assert!(!range.contains(datetime!(2023-12-31 23:59:59 UTC)));
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let err = DateRange::new(date!(2024 - 02 - 01), date!(2024 - 01 - 01)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn last_representable_end_date_is_rejected() {
        let err = DateRange::new(date!(2024 - 01 - 01), Date::MAX).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let range = DateRange::new(date!(2024 - 01 - 01), date!(9999 - 12 - 30)).unwrap();
        assert!(range.contains(datetime!(2024-01-05 0:00 UTC)));
        assert_eq!(range.ends_before(), datetime!(9999-12-31 0:00 UTC));
    }
}
