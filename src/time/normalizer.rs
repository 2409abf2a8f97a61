//! Time window resolution

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Accepted zone-less date-time layouts
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// A resolved query window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub begin: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// Zone used to format the window in responses
    pub zone: Tz,
}

impl TimeWindow {
    /// Begin as an absolute instant
    pub fn begin_utc(&self) -> DateTime<Utc> {
        self.begin.with_timezone(&Utc)
    }

    /// End as an absolute instant
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }
}

/// A parsed date-time before zone resolution
#[derive(Debug)]
enum ParsedTime {
    /// Fixed offset only, e.g. `-06:00` or `Z`
    Offset(DateTime<FixedOffset>),
    /// Bracketed IANA zone, with or without an offset
    Named(DateTime<Tz>),
    /// No zone information at all
    Local(NaiveDateTime),
}

/// Resolves textual window bounds into instants
#[derive(Debug, Clone, Copy)]
pub struct TimeNormalizer {
    /// Length of the trailing window used when `begin` is absent
    default_span: Duration,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self {
            default_span: Duration::hours(24),
        }
    }
}

impl TimeNormalizer {
    /// Create a normalizer with a custom default window length
    pub fn new(default_span: Duration) -> Self {
        Self { default_span }
    }

    /// Resolve a window against `now`
    pub fn resolve(
        &self,
        begin: Option<&str>,
        end: Option<&str>,
        timezone: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TimeWindow> {
        let requested_zone = timezone
            .map(str::trim)
            .filter(|z| !z.is_empty())
            .map(parse_zone)
            .transpose()?;
        let fallback_zone = requested_zone.unwrap_or(Tz::UTC);

        let begin = begin.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());

        let begin = match begin {
            None => None,
            Some(text) => Some(match parse_time("begin", text)? {
                ParsedTime::Named(dt) => (dt.with_timezone(&Utc), dt.timezone()),
                ParsedTime::Offset(dt) => match requested_zone {
                    Some(zone) => (dt.with_timezone(&Utc), zone),
                    None => return Err(Error::ambiguous_timezone("begin", text)),
                },
                ParsedTime::Local(local) => (
                    localize(&local, fallback_zone)
                        .ok_or_else(|| Error::invalid_timestamp("begin", text))?,
                    fallback_zone,
                ),
            }),
        };
        // Without a begin, a named end zone is the window's zone
        let zone = match (begin, end) {
            (Some((_, zone)), _) => zone,
            (None, Some(text)) if requested_zone.is_none() => match parse_time("end", text)? {
                ParsedTime::Named(dt) => dt.timezone(),
                _ => fallback_zone,
            },
            (None, _) => fallback_zone,
        };

        let end_instant = match end {
            None => now,
            Some(text) => match parse_time("end", text)? {
                ParsedTime::Named(dt) => dt.with_timezone(&Utc),
                ParsedTime::Offset(dt) => dt.with_timezone(&Utc),
                ParsedTime::Local(local) => localize(&local, zone)
                    .ok_or_else(|| Error::invalid_timestamp("end", text))?,
            },
        };

        // A missing begin opens the default span before end
        let begin_instant = match begin {
            Some((instant, _)) => instant,
            None => end_instant
                .checked_sub_signed(self.default_span)
                .ok_or_else(|| {
                    Error::invalid_parameter(
                        "begin",
                        format!("default window before {end_instant} is out of range"),
                    )
                })?,
        };

        if end_instant < begin_instant {
            return Err(Error::invalid_parameter(
                "end",
                format!("end ({end_instant}) is before begin ({begin_instant})"),
            ));
        }

        Ok(TimeWindow {
            begin: begin_instant.with_timezone(&zone),
            end: end_instant.with_timezone(&zone),
            zone,
        })
    }
}

/// Parse an IANA zone name
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::unknown_timezone(name))
}

/// Format as `2024-01-01T00:00:00-06:00[America/Chicago]`
pub fn format_zoned(dt: &DateTime<Tz>) -> String {
    format!(
        "{}[{}]",
        dt.format("%Y-%m-%dT%H:%M:%S%:z"),
        dt.timezone().name()
    )
}

fn parse_time(field: &str, text: &str) -> Result<ParsedTime> {
    if let Some(head) = text.strip_suffix(']') {
        let Some((head, zone_name)) = head.rsplit_once('[') else {
            return Err(Error::invalid_timestamp(field, text));
        };
        let zone = parse_zone(zone_name)?;

        if let Some(dt) = parse_offset(head) {
            return Ok(ParsedTime::Named(dt.with_timezone(&zone)));
        }
        let local = parse_local(head).ok_or_else(|| Error::invalid_timestamp(field, text))?;
        let instant = localize(&local, zone).ok_or_else(|| Error::invalid_timestamp(field, text))?;
        return Ok(ParsedTime::Named(instant.with_timezone(&zone)));
    }

    if let Some(dt) = parse_offset(text) {
        return Ok(ParsedTime::Offset(dt));
    }

    parse_local(text)
        .map(ParsedTime::Local)
        .ok_or_else(|| Error::invalid_timestamp(field, text))
}

fn parse_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M%:z"))
        .ok()
}

fn parse_local(text: &str) -> Option<NaiveDateTime> {
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Attach a zone to a local time.
///
/// Overlaps resolve to the earlier instant; times inside a DST gap move
/// forward by an hour.
fn localize(local: &NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(local)
        .earliest()
        .or_else(|| {
            zone.from_local_datetime(&(*local + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
}
