//! Modification times as the ZIP container can store them.
//!
//! ZIP keeps MS-DOS date/time stamps: years 1980 through 2107 at two-second
//! resolution. Anything outside that range is replaced by the DOS epoch.

use std::time::{SystemTime, UNIX_EPOCH};

use time::macros::datetime;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// 1980-01-01T00:00:00Z, the earliest representable DOS timestamp.
pub const DOS_EPOCH: OffsetDateTime = datetime!(1980-01-01 0:00 UTC);

const MIN_YEAR: i32 = 1980;
const MAX_YEAR: i32 = 2107;

/// Clamp a UTC timestamp into the DOS range.
pub fn clamp(ts: OffsetDateTime) -> OffsetDateTime {
    let ts = ts.to_offset(time::UtcOffset::UTC);
    if (MIN_YEAR..=MAX_YEAR).contains(&ts.year()) {
        ts
    } else {
        DOS_EPOCH
    }
}

/// Convert a file-system time and clamp it. Never fails.
pub fn from_system_time(st: SystemTime) -> OffsetDateTime {
    let secs = match st.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_secs())
            .map(|s| -s)
            .unwrap_or(i64::MIN),
    };
    OffsetDateTime::from_unix_timestamp(secs)
        .map(clamp)
        .unwrap_or(DOS_EPOCH)
}

/// Encode as `(dos_time, dos_date)`.
pub fn to_dos(ts: OffsetDateTime) -> (u16, u16) {
    let ts = clamp(ts);
    let date = (((ts.year() - MIN_YEAR) as u16) << 9)
        | ((u8::from(ts.month()) as u16) << 5)
        | ts.day() as u16;
    let time = ((ts.hour() as u16) << 11) | ((ts.minute() as u16) << 5) | (ts.second() as u16 / 2);
    (time, date)
}

/// Decode a DOS stamp. Malformed fields decode to [`DOS_EPOCH`].
pub fn from_dos(dos_time: u16, dos_date: u16) -> OffsetDateTime {
    let year = MIN_YEAR + ((dos_date >> 9) & 0x7F) as i32;
    let month = ((dos_date >> 5) & 0x0F) as u8;
    let day = (dos_date & 0x1F) as u8;
    let hour = ((dos_time >> 11) & 0x1F) as u8;
    let minute = ((dos_time >> 5) & 0x3F) as u8;
    let second = ((dos_time & 0x1F) * 2) as u8;

    let date = Month::try_from(month)
        .ok()
        .and_then(|m| Date::from_calendar_date(year, m, day).ok());
    let time = Time::from_hms(hour, minute, second).ok();

    match (date, time) {
        (Some(date), Some(time)) => PrimitiveDateTime::new(date, time).assume_utc(),
        _ => DOS_EPOCH,
    }
}
