//! Hour buckets and their file names.
//!
//! A record belongs to the UTC hour its timestamp falls in. Every bucket maps
//! to exactly one file, `<prefix><YYYY>-<MM>-<DD>T<HH>00.log`, directly under
//! the writer's base directory. Fixed-width fields keep the names sorting in
//! time order, which holds for UTC years 0 through 9999; timestamps outside
//! that range have no bucket.

use std::fmt;

use time::{Duration, OffsetDateTime, Time, UtcOffset};

use crate::{Error, Result};

pub const BUCKET_EXTENSION: &str = "log";
const MAX_YEAR: i32 = 9999;

/// The UTC hour a timestamp falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket {
    start: OffsetDateTime,
}

impl Bucket {
    /// `None` when the timestamp's UTC year is outside `0..=9999`.
    pub fn of(timestamp: OffsetDateTime) -> Option<Self> {
        let utc = timestamp.checked_to_offset(UtcOffset::UTC)?;
        if !(0..=MAX_YEAR).contains(&utc.year()) {
            return None;
        }
        // Adding at most 23 hours to midnight stays within the same day.
        let start = utc.replace_time(Time::MIDNIGHT) + Duration::hours(i64::from(utc.hour()));
        Some(Self { start })
    }

    /// First instant of the hour, in UTC.
    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn contains(&self, timestamp: OffsetDateTime) -> bool {
        Bucket::of(timestamp) == Some(*self)
    }

    pub fn name(&self, prefix: &str) -> String {
        format!("{prefix}{self}.{BUCKET_EXTENSION}")
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.start.date();
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}00",
            date.year(),
            u8::from(date.month()),
            date.day(),
            self.start.hour()
        )
    }
}

pub fn bucket_name(prefix: &str, timestamp: OffsetDateTime) -> Option<String> {
    Bucket::of(timestamp).map(|bucket| bucket.name(prefix))
}

/// Reject prefixes that would place bucket files outside the base directory.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix == "." || prefix == ".." || prefix.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidConfig(format!(
            "prefix must be a plain file name fragment: {prefix:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::{Date, Month};

    #[test]
    fn formats_hour_bucket() {
        let name = bucket_name("app-", datetime!(2024-01-01 10:30:00 UTC));
        assert_eq!(name.as_deref(), Some("app-2024-01-01T1000.log"));
    }

    #[test]
    fn zero_pads_every_field() {
        let name = bucket_name("", datetime!(2024-02-03 04:59:59.999 UTC));
        assert_eq!(name.as_deref(), Some("2024-02-03T0400.log"));
    }

    #[test]
    fn normalizes_to_utc() {
        // 01:30 at +02:00 is 23:30 UTC on the previous day.
        let name = bucket_name("svc.", datetime!(2024-06-01 01:30:00 +2));
        assert_eq!(name.as_deref(), Some("svc.2024-05-31T2300.log"));
    }

    #[test]
    fn same_hour_same_bucket() {
        let t = datetime!(2024-01-01 10:00:00 UTC);
        assert_eq!(bucket_name("p", t), bucket_name("p", t + Duration::minutes(59)));
        assert_ne!(bucket_name("p", t), bucket_name("p", t + Duration::minutes(61)));
    }

    #[test]
    fn buckets_order_by_time() {
        let a = Bucket::of(datetime!(2024-01-01 23:59:00 UTC)).expect("bucket");
        let b = Bucket::of(datetime!(2024-01-02 00:00:00 UTC)).expect("bucket");
        assert!(a < b);
        assert_eq!(a.start(), datetime!(2024-01-01 23:00:00 UTC));
        assert!(a.contains(datetime!(2024-01-01 23:00:00 UTC)));
        assert!(!a.contains(datetime!(2024-01-02 00:00:00 UTC)));
    }

    #[test]
    fn out_of_range_years_have_no_bucket() {
        // Valid at -01:00 but past the representable range once moved to UTC.
        assert_eq!(Bucket::of(datetime!(9999-12-31 23:30:00 -1)), None);
        let year = |year| {
            Date::from_calendar_date(year, Month::March, 1)
                .expect("date")
                .with_hms(10, 0, 0)
                .expect("time")
                .assume_utc()
        };
        assert_eq!(bucket_name("p-", year(-1)), None);
        assert_eq!(
            bucket_name("p-", year(0)).as_deref(),
            Some("p-0000-03-01T1000.log")
        );
        assert_eq!(
            bucket_name("p-", datetime!(9999-12-31 23:59:59 UTC)).as_deref(),
            Some("p-9999-12-31T2300.log")
        );
    }

    #[test]
    fn rejects_path_like_prefix() {
        assert!(validate_prefix("app-").is_ok());
        assert!(validate_prefix("").is_ok());
        for bad in ["logs/app-", "..", ".", "a\\b", "nul\0"] {
            let err = validate_prefix(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)));
        }
    }
}
