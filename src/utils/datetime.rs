//! Date/time normalization for `xmp:ModifyDate`
//!
//! XMP wants ISO 8601. Callers hand us anything from proper ISO strings to
//! EXIF-style `YYYY:MM:DD HH:MM:SS` stamps; a timestamp that cannot be parsed
//! is replaced with the current UTC time rather than rejecting the write.

use chrono::{NaiveDate, NaiveDateTime, Utc};

/// EXIF `DateTime` layout, the fallback parse
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// ISO 8601 layout written for normalized timestamps
const ISO_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Calendar date with optional time and timezone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmpDateTime {
    /// Year
    pub year: i32,
    /// Month (1-12)
    pub month: u8,
    /// Day (1-31)
    pub day: u8,
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
    /// Nanoseconds (0-999999999)
    pub nanosecond: u32,
    /// Whether time components were present
    pub has_time: bool,
    /// Timezone offset in minutes east of UTC; `Some(0)` is written as `Z`
    pub tz_offset_minutes: Option<i16>,
}

/// Cursor over the ASCII bytes of a timestamp
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> Option<()> {
        (self.peek()? == expected).then(|| self.pos += 1)
    }

    /// Exactly `width` ASCII digits
    fn digits(&mut self, width: usize) -> Option<u32> {
        let chunk = self.bytes.get(self.pos..self.pos + width)?;
        if !chunk.iter().all(u8::is_ascii_digit) {
            return None;
        }
        self.pos += width;
        Some(chunk.iter().fold(0, |acc, d| acc * 10 + u32::from(d - b'0')))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

impl XmpDateTime {
    /// Parse an ISO 8601 calendar date or date-time
    ///
    /// Accepted forms:
    /// - `YYYY-MM-DD`
    /// - `YYYY-MM-DDThh:mm` and `YYYY-MM-DDThh:mm:ss[.fff]`
    /// - either followed by `Z` or `+hh:mm` / `-hh:mm`
    ///
    /// A space is accepted in place of `T`. Returns `None` for anything else,
    /// including out-of-range components.
    ///
    /// # Example
    ///
    /// ```rust
    /// use imgmeta::utils::datetime::XmpDateTime;
    ///
    /// let dt = XmpDateTime::parse("2023-12-25T10:30:00Z").unwrap();
    /// assert_eq!((dt.year, dt.month, dt.day), (2023, 12, 25));
    /// assert_eq!(dt.tz_offset_minutes, Some(0));
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let mut cur = Cursor {
            bytes: s.as_bytes(),
            pos: 0,
        };

        let year = cur.digits(4)? as i32;
        cur.eat(b'-')?;
        let month = cur.digits(2)? as u8;
        cur.eat(b'-')?;
        let day = cur.digits(2)? as u8;

        let mut dt = XmpDateTime {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
            has_time: false,
            tz_offset_minutes: None,
        };

        if !cur.at_end() {
            if cur.eat(b'T').is_none() {
                cur.eat(b' ')?;
            }
            dt.has_time = true;
            dt.hour = cur.digits(2)? as u8;
            cur.eat(b':')?;
            dt.minute = cur.digits(2)? as u8;

            if cur.eat(b':').is_some() {
                dt.second = cur.digits(2)? as u8;
                if cur.eat(b'.').is_some() {
                    dt.nanosecond = Self::parse_fraction(&mut cur)?;
                }
            }

            match cur.peek() {
                None => {}
                Some(b'Z') => {
                    cur.pos += 1;
                    dt.tz_offset_minutes = Some(0);
                }
                Some(sign @ (b'+' | b'-')) => {
                    cur.pos += 1;
                    let hours = cur.digits(2)? as i16;
                    cur.eat(b':')?;
                    let minutes = cur.digits(2)? as i16;
                    if hours > 23 || minutes > 59 {
                        return None;
                    }
                    let offset = hours * 60 + minutes;
                    dt.tz_offset_minutes = Some(if sign == b'-' { -offset } else { offset });
                }
                Some(_) => return None,
            }
        }

        if !cur.at_end() || !dt.is_valid() {
            return None;
        }
        Some(dt)
    }

    /// Fractional seconds, normalized to nanoseconds
    fn parse_fraction(cur: &mut Cursor<'_>) -> Option<u32> {
        let start = cur.pos;
        while cur.peek().is_some_and(|b| b.is_ascii_digit()) {
            cur.pos += 1;
        }
        let digits = &cur.bytes[start..cur.pos];
        if digits.is_empty() {
            return None;
        }
        // Keep nanosecond precision, drop anything finer
        let mut nanos = 0u32;
        for i in 0..9 {
            let digit = digits.get(i).map_or(0, |d| u32::from(d - b'0'));
            nanos = nanos * 10 + digit;
        }
        Some(nanos)
    }

    fn is_valid(&self) -> bool {
        NaiveDate::from_ymd_opt(self.year, u32::from(self.month), u32::from(self.day)).is_some()
            && self.hour <= 23
            && self.minute <= 59
            && self.second <= 59
    }

    /// Format as `YYYY-MM-DDThh:mm:ss[.fff][Z|±hh:mm]`
    ///
    /// A date without time is written at midnight.
    pub fn format(&self) -> String {
        let mut result = format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        );

        if self.nanosecond != 0 {
            let fraction = format!("{:09}", self.nanosecond);
            result.push('.');
            result.push_str(fraction.trim_end_matches('0'));
        }

        match self.tz_offset_minutes {
            None => {}
            Some(0) => result.push('Z'),
            Some(offset) => {
                let sign = if offset < 0 { '-' } else { '+' };
                let offset = offset.unsigned_abs();
                result.push_str(&format!("{}{:02}:{:02}", sign, offset / 60, offset % 60));
            }
        }

        result
    }
}

/// Normalize a caller-supplied timestamp to ISO 8601
///
/// Tries ISO 8601 first, then the EXIF `YYYY:MM:DD HH:MM:SS` layout, and
/// finally falls back to the current UTC time.
pub fn normalize_modify_date(input: &str) -> String {
    if let Some(dt) = XmpDateTime::parse(input) {
        return dt.format();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, EXIF_DATETIME_FORMAT) {
        return dt.format(ISO_DATETIME_FORMAT).to_string();
    }
    log::debug!("unparsable datetime {input:?}, stamping current UTC time");
    now_utc()
}

/// Current UTC time, second precision, `Z` suffix
pub fn now_utc() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
