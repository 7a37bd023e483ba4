use chrono::{DateTime, Local, TimeZone, Utc};

/// Layout of the `timestamp` attribute: local wall-clock time, millisecond
/// precision, no zone designator.
const SERVICE_MESSAGE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Format an attempt start time for a service message, in the local zone
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    format_timestamp_in(time, &Local)
}

pub fn format_timestamp_in<Tz>(time: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.with_timezone(zone)
        .format(SERVICE_MESSAGE_TIMESTAMP)
        .to_string()
}
