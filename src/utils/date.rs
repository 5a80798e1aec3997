//! UTC datetime utilities without timezone dependencies.
//!
//! Provides a lightweight `DateTimeUtc` struct for date/time handling,
//! optimized for static site generation use cases (post dates, RSS feeds).
//!
//! # Examples
//!
//! ```ignore
//! let dt = DateTimeUtc::parse("2024-06-15").unwrap();
//! let dt = DateTimeUtc::parse("2024-06-15T14:30:45Z").unwrap();
//!
//! assert_eq!(dt.to_rfc2822(), "Sat, 15 Jun 2024 14:30:45 GMT");
//! ```

use anyhow::{Result, bail};

/// Abbreviated month names (index 0 = January).
pub const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Full month names (index 0 = January).
pub const MONTHS_FULL: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// UTC datetime without timezone complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub const fn from_ymd(year: u16, month: u8, day: u8) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Parse from "YYYY-MM-DD" or "YYYY-MM-DDTHH:MM:SSZ" format
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();

        // Minimum: "YYYY-MM-DD" (10 chars)
        if bytes.len() < 10 {
            return None;
        }

        // Parse date part
        let year = parse_u16(&bytes[0..4])?;
        if bytes[4] != b'-' {
            return None;
        }
        let month = parse_u8(&bytes[5..7])?;
        if bytes[7] != b'-' {
            return None;
        }
        let day = parse_u8(&bytes[8..10])?;

        // Check for time part (RFC3339)
        let (hour, minute, second) = if bytes.len() >= 20 && bytes[10] == b'T' && bytes[19] == b'Z'
        {
            if bytes[13] != b':' || bytes[16] != b':' {
                return None;
            }
            (
                parse_u8(&bytes[11..13])?,
                parse_u8(&bytes[14..16])?,
                parse_u8(&bytes[17..19])?,
            )
        } else if bytes.len() == 10 {
            (0, 0, 0)
        } else {
            return None;
        };

        let dt = Self::new(year, month, day, hour, minute, second);
        dt.validate().ok()?;
        Some(dt)
    }

    /// Convert a Unix timestamp to a civil UTC datetime.
    ///
    /// Used for the file-mtime fallback when a post has no `date` field.
    pub fn from_unix_timestamp(secs: i64) -> Option<Self> {
        let days = secs.div_euclid(86_400);
        let rem = secs.rem_euclid(86_400);

        let (year, month, day) = civil_from_days(days);
        if !(1..=u16::MAX as i64).contains(&year) {
            return None;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let dt = Self::new(
            year as u16,
            month,
            day,
            (rem / 3600) as u8,
            ((rem / 60) % 60) as u8,
            (rem % 60) as u8,
        );
        Some(dt)
    }

    #[allow(clippy::trivially_copy_pass_by_ref)] // Method style is more idiomatic
    pub fn validate(&self) -> Result<()> {
        let Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = *self;

        if !(1..=12).contains(&month) {
            bail!("month is invalid: {month}");
        }

        let max_days = Self::days_in_month(year, month);
        if day == 0 || day > max_days {
            bail!("day is invalid: {day}");
        }
        if hour > 23 {
            bail!("hour is invalid: {hour}");
        }
        if minute > 59 {
            bail!("minute is invalid: {minute}");
        }
        if second > 59 {
            bail!("second is invalid: {second}");
        }

        Ok(())
    }

    #[inline]
    #[allow(clippy::manual_is_multiple_of)] // Manual impl for const fn
    const fn is_leap_year(year: u16) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    #[inline]
    const fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    /// Format as RFC 3339 (ISO 8601): `YYYY-MM-DDTHH:MM:SSZ`
    pub fn to_rfc3339(self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// Format as RFC 2822 for RSS `pubDate` fields.
    pub fn to_rfc2822(self) -> String {
        const WEEKDAYS: [&str; 7] = ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"];

        // Zeller's congruence for weekday calculation
        let weekday = self.weekday_index();

        format!(
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[weekday],
            self.day,
            MONTHS_SHORT[(self.month - 1) as usize],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }

    /// Short listing label, e.g. `"May 15"`.
    pub fn to_label(self) -> String {
        format!("{} {}", MONTHS_SHORT[(self.month - 1) as usize], self.day)
    }

    /// Formal label, e.g. `"the 15th of May, 2025"`.
    pub fn to_formal_label(self) -> String {
        format!(
            "the {}{} of {}, {}",
            self.day,
            ordinal_suffix(self.day),
            MONTHS_FULL[(self.month - 1) as usize],
            self.year
        )
    }

    #[inline]
    #[allow(clippy::trivially_copy_pass_by_ref)] // Method style is more idiomatic
    #[allow(clippy::cast_sign_loss)] // Result of % 7 is always 0-6
    fn weekday_index(&self) -> usize {
        let (y, m) = if self.month < 3 {
            (i32::from(self.year) - 1, i32::from(self.month) + 12)
        } else {
            (i32::from(self.year), i32::from(self.month))
        };
        let d = i32::from(self.day);
        ((d + (13 * (m + 1)) / 5 + y + y / 4 - y / 100 + y / 400) % 7) as usize
    }
}

/// Ordinal suffix for a day of month (1st, 2nd, 3rd, 4th, ...).
pub const fn ordinal_suffix(day: u8) -> &'static str {
    match day {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    }
}

/// Days since 1970-01-01 to civil (year, month, day).
///
/// Howard Hinnant's branchless civil-from-days algorithm.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn civil_from_days(z: i64) -> (i64, u8, u8) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = (doy - (153 * mp + 2) / 5 + 1) as u8; // [1, 31]
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8; // [1, 12]
    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Parse 2-digit ASCII number
#[inline]
fn parse_u8(bytes: &[u8]) -> Option<u8> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = bytes[0].wrapping_sub(b'0');
    let d2 = bytes[1].wrapping_sub(b'0');
    if d1 > 9 || d2 > 9 {
        return None;
    }
    Some(d1 * 10 + d2)
}

/// Parse 4-digit ASCII number
#[inline]
fn parse_u16(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != 4 {
        return None;
    }
    let mut result = 0u16;
    let mut i = 0;
    while i < bytes.len() {
        let d = bytes[i].wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        result = result * 10 + u16::from(d);
        i += 1;
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_only() {
        let dt = DateTimeUtc::parse("2024-06-15").unwrap();
        assert_eq!((dt.year, dt.month, dt.day), (2024, 6, 15));
        assert_eq!((dt.hour, dt.minute, dt.second), (0, 0, 0));
    }

    #[test]
    fn test_parse_rfc3339() {
        let dt = DateTimeUtc::parse("2024-06-15T14:30:45Z").unwrap();
        assert_eq!((dt.hour, dt.minute, dt.second), (14, 30, 45));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DateTimeUtc::parse("not a date").is_none());
        assert!(DateTimeUtc::parse("2024-13-01").is_none());
        assert!(DateTimeUtc::parse("2024-02-30").is_none());
        assert!(DateTimeUtc::parse("2024-06-15T14:30").is_none());
    }

    #[test]
    fn test_leap_year() {
        assert!(DateTimeUtc::parse("2024-02-29").is_some());
        assert!(DateTimeUtc::parse("2023-02-29").is_none());
        assert!(DateTimeUtc::parse("2000-02-29").is_some());
        assert!(DateTimeUtc::parse("1900-02-29").is_none());
    }

    #[test]
    fn test_to_rfc2822() {
        let dt = DateTimeUtc::new(2024, 6, 15, 14, 30, 45);
        assert_eq!(dt.to_rfc2822(), "Sat, 15 Jun 2024 14:30:45 GMT");
    }

    #[test]
    fn test_from_unix_timestamp() {
        // 2024-06-15T14:30:45Z
        let dt = DateTimeUtc::from_unix_timestamp(1_718_461_845).unwrap();
        assert_eq!((dt.year, dt.month, dt.day), (2024, 6, 15));
        assert_eq!((dt.hour, dt.minute, dt.second), (14, 30, 45));

        // Epoch itself
        let dt = DateTimeUtc::from_unix_timestamp(0).unwrap();
        assert_eq!((dt.year, dt.month, dt.day), (1970, 1, 1));
    }

    #[test]
    fn test_labels() {
        let dt = DateTimeUtc::from_ymd(2025, 5, 15);
        assert_eq!(dt.to_label(), "May 15");
        assert_eq!(dt.to_formal_label(), "the 15th of May, 2025");

        let dt = DateTimeUtc::from_ymd(2025, 1, 1);
        assert_eq!(dt.to_formal_label(), "the 1st of January, 2025");

        let dt = DateTimeUtc::from_ymd(2025, 3, 22);
        assert_eq!(dt.to_formal_label(), "the 22nd of March, 2025");

        let dt = DateTimeUtc::from_ymd(2025, 3, 23);
        assert_eq!(dt.to_formal_label(), "the 23rd of March, 2025");
    }

    #[test]
    fn test_ordering() {
        let older = DateTimeUtc::from_ymd(2023, 1, 1);
        let newer = DateTimeUtc::from_ymd(2024, 1, 1);
        assert!(newer > older);
    }
}
