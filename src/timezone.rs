use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in the timezone `canonical_timezone`, falling back to UTC if
/// the timezone name is not recognised.
pub fn today(canonical_timezone: &str) -> time::Date {
    let offset = get_local_offset(canonical_timezone).unwrap_or(UtcOffset::UTC);

    OffsetDateTime::now_utc().to_offset(offset).date()
}
