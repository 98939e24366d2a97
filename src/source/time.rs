use chrono::{FixedOffset, NaiveDate, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;

// Example: "19.01.23 12:34" or "2019.01.23 12:34"
lazy_static! {
    static ref WRITTEN_AT_RE: Regex =
        Regex::new(r"^(\d{2}|\d{4})\.(\d{1,2})\.(\d{1,2})(?:\s+(\d{1,2}):(\d{2}))?$").unwrap();
}

const SECONDS_PER_HOUR: i32 = 3600;

/// Converts scraped `written_at` values into Unix timestamps.
///
/// The scrape records wall-clock time without a zone, so every value is read
/// in the same fixed offset.
#[derive(Clone, Copy, Debug)]
pub struct TimeParser {
    offset: FixedOffset,
}

impl TimeParser {
    pub fn new(utc_offset_hours: i32) -> Option<TimeParser> {
        utc_offset_hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(FixedOffset::east_opt)
            .map(|offset| TimeParser { offset })
    }

    pub fn parse(&self, value: &str) -> Option<i64> {
        let captures = WRITTEN_AT_RE.captures(value.trim())?;

        let year_text = captures.get(1)?.as_str();
        let year = year_text.parse::<i32>().ok()?;
        let year = if year_text.len() == 2 { 2000 + year } else { year };
        let month = captures.get(2)?.as_str().parse::<u32>().ok()?;
        let day = captures.get(3)?.as_str().parse::<u32>().ok()?;

        let (hour, minute) = match captures.get(4).zip(captures.get(5)) {
            Some((hour, minute)) => (
                hour.as_str().parse::<u32>().ok()?,
                minute.as_str().parse::<u32>().ok()?,
            ),
            None => (0, 0),
        };

        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;

        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|time| time.timestamp())
    }
}

impl Default for TimeParser {
    fn default() -> Self {
        TimeParser {
            offset: FixedOffset::east_opt(9 * SECONDS_PER_HOUR).unwrap(),
        }
    }
}
