use crate::chunk::{Chunk, ChunkType};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("Expected tIME chunk")]
    WrongType(ChunkType),

    #[error("Invalid tIME chunk size")]
    InvalidSize(usize),

    #[error("Invalid month in tIME chunk")]
    InvalidMonth(u8),

    #[error("Invalid day in tIME chunk")]
    InvalidDay(u8),

    #[error("Invalid hour in tIME chunk")]
    InvalidHour(u8),

    #[error("Invalid minute in tIME chunk")]
    InvalidMinute(u8),

    #[error("Invalid second in tIME chunk")]
    InvalidSecond(u8),

    #[error("Failed to create date from tIME chunk")]
    DateConstruction,
}

/// Image last-modification time, as stored in tIME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// The same instant on the proleptic Gregorian calendar, with
    /// out-of-range fields (31 February, second 60) rolled over.
    pub date: CalendarDateTime,
}

/// Decode a tIME chunk.
///
/// The day is only checked against 1-31, not against the length of the
/// month; the derived [`Timestamp::date`] rolls such days over into the next
/// month.
pub fn extract_timestamp(chunk: &Chunk<'_>) -> Result<Timestamp, TimeError> {
    if chunk.chunk_type != ChunkType::tIME {
        return Err(TimeError::WrongType(chunk.chunk_type));
    }
    let data = chunk.data;
    if data.len() != 7 {
        return Err(TimeError::InvalidSize(data.len()));
    }

    let year = u16::from_be_bytes([data[0], data[1]]);
    let [month, day, hour, minute, second] = [data[2], data[3], data[4], data[5], data[6]];

    if !(1..=12).contains(&month) {
        return Err(TimeError::InvalidMonth(month));
    }
    if !(1..=31).contains(&day) {
        return Err(TimeError::InvalidDay(day));
    }
    if hour > 23 {
        return Err(TimeError::InvalidHour(hour));
    }
    if minute > 59 {
        return Err(TimeError::InvalidMinute(minute));
    }
    // 60 allows for a leap second.
    if second > 60 {
        return Err(TimeError::InvalidSecond(second));
    }

    let date = CalendarDateTime::from_fields(
        i64::from(year),
        i64::from(month),
        i64::from(day),
        i64::from(hour),
        i64::from(minute),
        i64::from(second),
    )
    .ok_or(TimeError::DateConstruction)?;

    Ok(Timestamp {
        year,
        month,
        day,
        hour,
        minute,
        second,
        date,
    })
}

/// A normalised UTC date and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDateTime {
    pub year: i32,
    /// 1-12
    pub month: u8,
    /// 1-31, valid for the month
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

const SECONDS_PER_DAY: i64 = 86_400;

impl CalendarDateTime {
    /// Build a date from fields that may overflow their ranges; overflow
    /// carries into the next larger unit. Returns `None` if the result does
    /// not fit.
    pub fn from_fields(
        year: i64,
        month: i64,
        day: i64,
        hour: i64,
        minute: i64,
        second: i64,
    ) -> Option<Self> {
        let years = (month - 1).div_euclid(12);
        let month = (month - 1).rem_euclid(12) + 1;
        let days = days_from_civil(year.checked_add(years)?, month, 1)?.checked_add(day - 1)?;
        let seconds = days
            .checked_mul(SECONDS_PER_DAY)?
            .checked_add(hour.checked_mul(3600)?)?
            .checked_add(minute.checked_mul(60)?)?
            .checked_add(second)?;
        Self::from_unix_timestamp(seconds)
    }

    /// Seconds since 1970-01-01T00:00:00Z.
    pub fn from_unix_timestamp(seconds: i64) -> Option<Self> {
        let days = seconds.div_euclid(SECONDS_PER_DAY);
        let secs = seconds.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days)?;
        Some(Self {
            year: i32::try_from(year).ok()?,
            month,
            day,
            hour: (secs / 3600) as u8,
            minute: (secs / 60 % 60) as u8,
            second: (secs % 60) as u8,
        })
    }

    /// The current system time.
    pub fn now() -> Self {
        let seconds = match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            Err(before) => -(before.duration().as_secs() as i64),
        };
        Self::from_unix_timestamp(seconds).unwrap_or(Self {
            year: 1970,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        })
    }

    pub fn unix_timestamp(&self) -> i64 {
        let days = days_from_civil(i64::from(self.year), i64::from(self.month), i64::from(self.day))
            .unwrap_or_default();
        days * SECONDS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`
    pub fn to_iso8601(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CalendarDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Serialize for CalendarDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// Conversions between civil dates and days since 1970-01-01 on the proleptic
// Gregorian calendar, using 400-year eras of 146097 days.

fn days_from_civil(year: i64, month: i64, day: i64) -> Option<i64> {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era.checked_mul(146_097)?.checked_add(doe - 719_468)
}

fn civil_from_days(days: i64) -> Option<(i64, u8, u8)> {
    let z = days.checked_add(719_468)?;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    Some((year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::read_chunk;
    use crate::test_support::png_chunk;
    use assert_matches::assert_matches;

    fn timestamp(data: &[u8]) -> Result<Timestamp, TimeError> {
        let buf = png_chunk(b"tIME", data);
        let (chunk, _) = read_chunk(&buf, 0).unwrap();
        extract_timestamp(&chunk)
    }

    #[test]
    fn test_extract_timestamp() {
        let ts = timestamp(&[0x07, 0xe8, 1, 15, 14, 30, 45]).unwrap();
        assert_eq!(ts.year, 2024);
        assert_eq!(ts.month, 1);
        assert_eq!(ts.day, 15);
        assert_eq!(ts.hour, 14);
        assert_eq!(ts.minute, 30);
        assert_eq!(ts.second, 45);
        assert_eq!(ts.date.year, 2024);
        assert_eq!(ts.date.month, 1);
        assert_eq!(ts.date.day, 15);
        assert_eq!(ts.date.to_iso8601(), "2024-01-15T14:30:45Z");
        assert_eq!(ts.date.unix_timestamp(), 1_705_329_045);
    }

    #[test]
    fn test_wrong_type_and_size() {
        let buf = png_chunk(b"pHYs", &[0x07, 0xe8, 1, 15, 14, 30, 45]);
        let (chunk, _) = read_chunk(&buf, 0).unwrap();
        assert_matches!(extract_timestamp(&chunk), Err(TimeError::WrongType(ChunkType::pHYs)));

        let err = timestamp(&[0x07, 0xe8, 1, 15, 14, 30]).unwrap_err();
        assert_matches!(err, TimeError::InvalidSize(6));
        assert_eq!(err.to_string(), "Invalid tIME chunk size");
        assert_matches!(timestamp(&[0; 8]), Err(TimeError::InvalidSize(8)));
    }

    #[test]
    fn test_range_checks() {
        assert_matches!(timestamp(&[0x07, 0xe8, 0, 1, 0, 0, 0]), Err(TimeError::InvalidMonth(0)));
        assert_matches!(timestamp(&[0x07, 0xe8, 13, 1, 0, 0, 0]), Err(TimeError::InvalidMonth(13)));
        assert_matches!(timestamp(&[0x07, 0xe8, 1, 0, 0, 0, 0]), Err(TimeError::InvalidDay(0)));
        assert_matches!(timestamp(&[0x07, 0xe8, 1, 32, 0, 0, 0]), Err(TimeError::InvalidDay(32)));
        assert_matches!(timestamp(&[0x07, 0xe8, 1, 1, 24, 0, 0]), Err(TimeError::InvalidHour(24)));
        assert_matches!(timestamp(&[0x07, 0xe8, 1, 1, 0, 60, 0]), Err(TimeError::InvalidMinute(60)));
        assert_matches!(timestamp(&[0x07, 0xe8, 1, 1, 0, 0, 61]), Err(TimeError::InvalidSecond(61)));

        let err = timestamp(&[0x07, 0xe8, 1, 1, 0, 0, 61]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid second in tIME chunk");
    }

    #[test]
    fn test_day_is_not_checked_against_month() {
        // 31 February 2023 is accepted and rolls over to 3 March.
        let ts = timestamp(&[0x07, 0xe7, 2, 31, 0, 0, 0]).unwrap();
        assert_eq!((ts.month, ts.day), (2, 31));
        assert_eq!((ts.date.year, ts.date.month, ts.date.day), (2023, 3, 3));

        // 2024 is a leap year.
        let ts = timestamp(&[0x07, 0xe8, 2, 31, 0, 0, 0]).unwrap();
        assert_eq!((ts.date.month, ts.date.day), (3, 2));
    }

    #[test]
    fn test_leap_second_rolls_over() {
        let ts = timestamp(&[0x07, 0xdf, 12, 31, 23, 59, 60]).unwrap();
        assert_eq!(ts.second, 60);
        assert_eq!(ts.date.to_iso8601(), "2016-01-01T00:00:00Z");
    }

    #[test]
    fn test_extreme_years() {
        let ts = timestamp(&[0, 0, 1, 1, 0, 0, 0]).unwrap();
        assert_eq!(ts.date.to_iso8601(), "0000-01-01T00:00:00Z");
        let ts = timestamp(&[0xff, 0xff, 12, 31, 23, 59, 59]).unwrap();
        assert_eq!(ts.date.year, 65535);
    }

    #[test]
    fn test_unix_round_trip() {
        for seconds in [0, 951_782_400, 1_705_329_045, -86_400, 253_402_300_799] {
            let date = CalendarDateTime::from_unix_timestamp(seconds).unwrap();
            assert_eq!(date.unix_timestamp(), seconds);
        }
        let epoch = CalendarDateTime::from_unix_timestamp(0).unwrap();
        assert_eq!(epoch.to_string(), "1970-01-01T00:00:00Z");
        let leap_day = CalendarDateTime::from_unix_timestamp(951_782_400).unwrap();
        assert_eq!(leap_day.to_string(), "2000-02-29T00:00:00Z");
    }
}
