//! Clinic-local wall-clock handling.
//!
//! Appointment times are chosen by a person looking at a clock on the clinic
//! wall. They are stored as UTC instants, and every conversion back for
//! display goes through the clinic's stored offset - never through UTC field
//! extraction or string slicing of an RFC3339 literal. For any wall-clock
//! tuple `t` picked in the clinic zone, `to_wall_clock(to_instant(t)) == t`,
//! including dates on month and year boundaries.

use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc,
};

/// Offsets beyond UTC-14..UTC+14 do not exist on any civil clock.
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

const HHMM_FORMAT: &str = "%H:%M";

/// Build the clinic's fixed zone from its stored offset, east of UTC
/// positive. Returns `None` for offsets outside the civil range.
pub fn clinic_zone(offset_minutes: i32) -> Option<FixedOffset> {
    if offset_minutes.abs() > MAX_OFFSET_MINUTES {
        return None;
    }
    FixedOffset::east_opt(offset_minutes * 60)
}

/// Encode a wall-clock date and time chosen in `zone` as the UTC instant it
/// names.
pub fn to_instant(date: NaiveDate, time: NaiveTime, zone: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(time);
    match local.and_local_timezone(zone) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // Fixed offsets have no gaps or folds; keep the conversion total anyway.
        _ => Utc.from_utc_datetime(&(local - Duration::seconds(zone.local_minus_utc() as i64))),
    }
}

/// Decode a stored instant back into the wall-clock fields a viewer in
/// `zone` would read off their clock.
pub fn to_wall_clock(instant: DateTime<Utc>, zone: FixedOffset) -> NaiveDateTime {
    instant.with_timezone(&zone).naive_local()
}

/// The calendar day `instant` falls on for a viewer in `zone`.
pub fn local_date(instant: DateTime<Utc>, zone: FixedOffset) -> NaiveDate {
    instant.with_timezone(&zone).date_naive()
}

/// Parse a schedule time in strict `HH:mm` form.
pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, HHMM_FORMAT).ok()
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format(HHMM_FORMAT).to_string()
}

/// Serde adapters for `NaiveTime` fields carried as `HH:mm` strings on the
/// wire, the form schedule windows and slot listings use.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw)
            .ok_or_else(|| de::Error::custom(format!("expected HH:mm time, got {:?}", raw)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(t) => serializer.serialize_some(&crate::time::format_hhmm(*t)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw {
                Some(raw) => crate::time::parse_hhmm(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("expected HH:mm time, got {:?}", raw))),
                None => Ok(None),
            }
        }
    }
}
