//! A module to parse iCal feeds

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;

use super::timezone::ZoneRegistry;
use super::{prop, prop_param, prop_value};
use crate::error::ParseError;

/// One event extracted from a feed, with its date-times already resolved to instants
#[derive(Clone, Debug, PartialEq)]
pub struct FeedEvent {
    pub uid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// True iff the event's DTSTART is a DATE (no time-of-day at all)
    pub all_day: bool,
}

/// Parse a whole feed body into its events.
///
/// The feed's `VTIMEZONE` definitions are registered into `zones` before any event is
/// converted, so they take precedence over the registry's fallback for matching ids.
/// A VEVENT that cannot be decoded is logged and skipped, it does not fail its siblings;
/// a body with no VCALENDAR at all is an error (the source is broken, not just sparse).
pub fn parse_feed(content: &str, zones: &mut ZoneRegistry) -> Result<Vec<FeedEvent>, ParseError> {
    let reader = ical::IcalParser::new(content.as_bytes());

    let mut events = Vec::new();
    let mut saw_calendar = false;
    for calendar in reader {
        let calendar = calendar.map_err(|err| ParseError::Syntax(err.to_string()))?;
        saw_calendar = true;

        zones.register_feed_zones(&calendar);

        for vevent in &calendar.events {
            match convert_event(vevent, zones) {
                Ok(event) => events.push(event),
                Err(err) => log::warn!("Skipping unusable VEVENT: {}", err),
            }
        }
    }

    if !saw_calendar {
        return Err(ParseError::Empty);
    }
    Ok(events)
}

fn convert_event(vevent: &IcalEvent, zones: &ZoneRegistry) -> Result<FeedEvent, ParseError> {
    let uid = prop_value(&vevent.properties, "UID")
        .ok_or(ParseError::MissingProperty("UID"))?
        .to_string();

    let dtstart = prop(&vevent.properties, "DTSTART").ok_or(ParseError::MissingProperty("DTSTART"))?;
    let start_value = DtValue::from_property(dtstart)?;
    let end_value = match prop(&vevent.properties, "DTEND") {
        Some(dtend) => Some(DtValue::from_property(dtend)?),
        None => None,
    };

    let all_day = start_value.is_date();
    let start = start_value.resolve(zones);
    let end = match end_value {
        Some(value) => value.resolve(zones),
        // No DTEND: an all-day event covers its day, a timed event is a point in time
        None if all_day => start + Duration::days(1),
        None => start,
    };
    // Some feeds emit inverted ranges; clamp rather than propagate a nonsense interval
    let end = if end < start { start } else { end };

    Ok(FeedEvent {
        uid,
        summary: prop_value(&vevent.properties, "SUMMARY").map(str::to_string),
        description: prop_value(&vevent.properties, "DESCRIPTION").map(str::to_string),
        location: prop_value(&vevent.properties, "LOCATION").map(str::to_string),
        start,
        end,
        all_day,
    })
}

/// A DTSTART/DTEND value as written in the feed, before zone resolution
#[derive(Clone, Debug, PartialEq)]
enum DtValue {
    /// A date with no time-of-day (iCal value type DATE)
    Date(NaiveDate, Option<String>),
    /// A local date-time, "floating" unless a TZID parameter names its zone
    Local(NaiveDateTime, Option<String>),
    /// An absolute date-time (`Z` suffix)
    Utc(NaiveDateTime),
}

impl DtValue {
    fn from_property(property: &Property) -> Result<Self, ParseError> {
        let raw = property
            .value
            .as_deref()
            .ok_or(ParseError::MissingProperty("DTSTART/DTEND"))?;
        let bad = || ParseError::InvalidValue("DTSTART/DTEND", raw.to_string());
        let tzid = prop_param(property, "TZID").map(str::to_string);

        let is_date = prop_param(property, "VALUE") == Some("DATE")
            || (raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()));
        if is_date {
            let date = NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| bad())?;
            return Ok(DtValue::Date(date, tzid));
        }

        if let Some(stripped) = raw.strip_suffix('Z') {
            let naive =
                NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S").map_err(|_| bad())?;
            return Ok(DtValue::Utc(naive));
        }

        let naive = NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S").map_err(|_| bad())?;
        Ok(DtValue::Local(naive, tzid))
    }

    fn is_date(&self) -> bool {
        match self {
            DtValue::Date(_, _) => true,
            _ => false,
        }
    }

    fn resolve(&self, zones: &ZoneRegistry) -> DateTime<Utc> {
        match self {
            DtValue::Date(date, tzid) => {
                let midnight = date
                    .and_hms_opt(0, 0, 0)
                    .unwrap(/* midnight always exists */);
                zones.resolve(tzid.as_deref(), midnight)
            }
            DtValue::Local(naive, tzid) => zones.resolve(tzid.as_deref(), *naive),
            DtValue::Utc(naive) => Utc.from_utc_datetime(naive),
        }
    }
}
