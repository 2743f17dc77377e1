use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{types::Type, Row};

use crate::error::AppError;

pub struct Utils {}

impl Utils {
    const DATE_FORMAT: &str = "%Y-%m-%d";

    fn parse_date(date_str: &str) -> Result<NaiveDate, AppError> {
        NaiveDate::parse_from_str(date_str.trim(), Self::DATE_FORMAT).map_err(|e| {
            AppError::Error(format!("Invalid date '{date_str}' (expected yyyy-mm-dd): {e}"))
        })
    }

    /// Returns UTC timestamps covering the whole of both days: the first second of
    /// `start_date_str` through the last second of `end_date_str`.
    pub fn range_date_bounds(
        start_date_str: &str,
        end_date_str: &str,
    ) -> Result<(i64, i64), AppError> {
        let start = Self::parse_date(start_date_str)?
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let end_time = NaiveTime::from_hms_opt(23, 59, 59)
            .ok_or_else(|| AppError::Error("Invalid end-of-day time".into()))?;
        let end = Self::parse_date(end_date_str)?
            .and_time(end_time)
            .and_utc()
            .timestamp();

        Ok((start, end))
    }

    pub fn timestamp_to_utc(timestamp: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(timestamp, 0)
    }

    /// Reads a unix-seconds column. A value chrono can't represent is a conversion
    /// error rather than a made-up date.
    pub fn row_timestamp(row: &Row, name: &str) -> rusqlite::Result<DateTime<Utc>> {
        let timestamp: i64 = row.get(name)?;
        Self::timestamp_to_utc(timestamp).ok_or_else(|| {
            let idx = row.as_ref().column_index(name).unwrap_or_default();
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Integer,
                format!("Timestamp {timestamp} in '{name}' is out of range").into(),
            )
        })
    }

    pub fn row_opt_timestamp(row: &Row, name: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
        match row.get::<_, Option<i64>>(name)? {
            Some(_) => Self::row_timestamp(row, name).map(Some),
            None => Ok(None),
        }
    }
}
