//! Request-scoped timezone resolution for feed date-times
//!
//! iCal feeds routinely contain "floating" date-times (no `TZID` parameter, no `Z`
//! suffix). Leaving them ambiguous would scatter events across the calendar, so every
//! aggregation request builds a [`ZoneRegistry`] seeded with a fixed America/New_York
//! rule (EST UTC−5 / EDT UTC−4, switching on the first Sunday of November and the second
//! Sunday of March) and then registers the feed's own `VTIMEZONE` definitions, which
//! override the fallback for matching identifiers.
//!
//! The registry is deliberately a per-request value, not a process-wide registration
//! table: concurrent requests each get their own and cannot race on shared zone state.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use ical::parser::ical::component::{IcalCalendar, IcalTimeZone, IcalTimeZoneTransitionType};
use ical::property::Property;

use super::prop_value;
use crate::config::FALLBACK_TIMEZONE;
use crate::error::ParseError;

/// "the Nth (or last) given weekday of a month, at a wall-clock time", which is the shape
/// of a yearly daylight-saving switch
#[derive(Clone, Debug, PartialEq)]
pub struct YearlyRule {
    pub month: u32,
    /// 1..=5 for "the Nth", -1 for "the last"
    pub week: i8,
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl YearlyRule {
    /// The local date-time this rule lands on in a given year
    fn occurrence(&self, year: i32) -> Option<NaiveDateTime> {
        let date = if self.week >= 1 {
            nth_weekday_of_month(year, self.month, self.weekday, self.week as u8)
        } else {
            last_weekday_of_month(year, self.month, self.weekday)
        };
        date.and_then(|date| date.and_hms_opt(self.hour, self.minute, 0))
    }
}

/// One of the two phases of an alternating (daylight-saving) rule
#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    /// Seconds east of UTC while this phase is in effect
    pub offset_secs: i32,
    /// When this phase takes over, every year
    pub start: YearlyRule,
}

/// How to map a zone's local times to UTC
#[derive(Clone, Debug, PartialEq)]
pub enum ZoneRule {
    /// A constant offset, in seconds east of UTC
    Fixed(i32),
    /// Standard and daylight phases alternating on yearly rules
    Alternating { standard: Phase, daylight: Phase },
}

impl ZoneRule {
    /// The fixed America/New_York rule used for floating times
    pub fn new_york() -> Self {
        ZoneRule::Alternating {
            standard: Phase {
                offset_secs: -5 * 3600,
                start: YearlyRule {
                    month: 11,
                    week: 1,
                    weekday: Weekday::Sun,
                    hour: 2,
                    minute: 0,
                },
            },
            daylight: Phase {
                offset_secs: -4 * 3600,
                start: YearlyRule {
                    month: 3,
                    week: 2,
                    weekday: Weekday::Sun,
                    hour: 2,
                    minute: 0,
                },
            },
        }
    }

    /// Interpret a local wall-clock time in this zone and convert it to an instant
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let offset = self.offset_at(local);
        Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(offset))))
    }

    fn offset_at(&self, local: NaiveDateTime) -> i32 {
        match self {
            ZoneRule::Fixed(offset) => *offset,
            ZoneRule::Alternating { standard, daylight } => {
                let year = local.year();
                match (daylight.start.occurrence(year), standard.start.occurrence(year)) {
                    (Some(daylight_start), Some(standard_start)) => {
                        // northern hemisphere: daylight runs between the two switches;
                        // southern hemisphere: it wraps around the new year
                        let in_daylight = if daylight_start <= standard_start {
                            local >= daylight_start && local < standard_start
                        } else {
                            local >= daylight_start || local < standard_start
                        };
                        if in_daylight {
                            daylight.offset_secs
                        } else {
                            standard.offset_secs
                        }
                    }
                    _ => standard.offset_secs,
                }
            }
        }
    }

    /// Build a rule from a feed-declared `VTIMEZONE` component.
    ///
    /// A zone with usable STANDARD and DAYLIGHT blocks becomes an alternating rule; a
    /// zone with a single block (or yearly rules this crate cannot decode) degrades to
    /// the fixed offset of its standard block.
    pub(crate) fn from_vtimezone(vtimezone: &IcalTimeZone) -> Result<(String, ZoneRule), ParseError> {
        let tzid = prop_value(&vtimezone.properties, "TZID")
            .ok_or(ParseError::MissingProperty("TZID"))?
            .to_string();

        let mut standard: Option<(i32, Option<YearlyRule>)> = None;
        let mut daylight: Option<(i32, Option<YearlyRule>)> = None;
        for transition in &vtimezone.transitions {
            let parsed = parse_transition(&transition.properties)?;
            match transition.transition {
                IcalTimeZoneTransitionType::STANDARD => standard = Some(parsed),
                IcalTimeZoneTransitionType::DAYLIGHT => daylight = Some(parsed),
            }
        }

        let rule = match (standard, daylight) {
            (Some((standard_offset, Some(standard_rule))), Some((daylight_offset, Some(daylight_rule)))) => {
                ZoneRule::Alternating {
                    standard: Phase {
                        offset_secs: standard_offset,
                        start: standard_rule,
                    },
                    daylight: Phase {
                        offset_secs: daylight_offset,
                        start: daylight_rule,
                    },
                }
            }
            (Some((standard_offset, _)), _) => ZoneRule::Fixed(standard_offset),
            (None, Some((daylight_offset, _))) => ZoneRule::Fixed(daylight_offset),
            (None, None) => {
                return Err(ParseError::InvalidValue(
                    "VTIMEZONE",
                    format!("no transition blocks in {}", tzid),
                ))
            }
        };

        Ok((tzid, rule))
    }
}

/// The set of timezones one aggregation request knows about
#[derive(Clone, Debug)]
pub struct ZoneRegistry {
    zones: HashMap<String, ZoneRule>,
}

impl ZoneRegistry {
    /// A registry that only knows the fallback zone
    pub fn with_fallback() -> Self {
        let mut zones = HashMap::new();
        zones.insert(FALLBACK_TIMEZONE.to_string(), ZoneRule::new_york());
        Self { zones }
    }

    pub fn register(&mut self, tzid: String, rule: ZoneRule) {
        self.zones.insert(tzid, rule);
    }

    /// Register every `VTIMEZONE` of a parsed calendar. Feed zones land on top of the
    /// fallback, so a feed redefining an already-known identifier wins for this registry.
    pub fn register_feed_zones(&mut self, calendar: &IcalCalendar) {
        for vtimezone in &calendar.timezones {
            match ZoneRule::from_vtimezone(vtimezone) {
                Ok((tzid, rule)) => {
                    self.zones.insert(tzid, rule);
                }
                Err(err) => log::warn!("Ignoring unusable VTIMEZONE: {}", err),
            }
        }
    }

    /// Interpret a local date-time in the given zone (or, for floating times, in the
    /// fallback zone) and convert it to an absolute instant
    pub fn resolve(&self, tzid: Option<&str>, local: NaiveDateTime) -> DateTime<Utc> {
        let rule = match tzid {
            None => self.fallback(),
            Some(id) => match self.zones.get(id) {
                Some(rule) => rule,
                None => {
                    log::warn!(
                        "Unknown timezone id {:?}, interpreting as {}",
                        id,
                        FALLBACK_TIMEZONE
                    );
                    self.fallback()
                }
            },
        };
        rule.to_utc(local)
    }

    fn fallback(&self) -> &ZoneRule {
        self.zones
            .get(FALLBACK_TIMEZONE)
            .expect("the fallback zone is registered at construction")
    }
}

fn parse_transition(properties: &[Property]) -> Result<(i32, Option<YearlyRule>), ParseError> {
    let offset_raw =
        prop_value(properties, "TZOFFSETTO").ok_or(ParseError::MissingProperty("TZOFFSETTO"))?;
    let offset = parse_utc_offset(offset_raw)?;

    // the wall-clock time of the switch comes from DTSTART, the yearly day from the RRULE
    let time = prop_value(properties, "DTSTART").and_then(parse_transition_time);
    let rule = prop_value(properties, "RRULE").and_then(|raw| parse_yearly_rrule(raw, time));

    Ok((offset, rule))
}

/// Parse a `±HHMM` or `±HHMMSS` UTC offset into seconds east of UTC
fn parse_utc_offset(raw: &str) -> Result<i32, ParseError> {
    let bad = || ParseError::InvalidValue("TZOFFSETTO", raw.to_string());

    let (sign, digits) = match raw.bytes().next() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => (1, raw),
    };
    if (digits.len() != 4 && digits.len() != 6) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }

    let hours: i32 = digits[0..2].parse().map_err(|_| bad())?;
    let minutes: i32 = digits[2..4].parse().map_err(|_| bad())?;
    let seconds: i32 = if digits.len() == 6 {
        digits[4..6].parse().map_err(|_| bad())?
    } else {
        0
    };

    Ok(sign * (hours * 3600 + minutes * 60 + seconds))
}

/// Extract the wall-clock time from a transition's DTSTART (e.g. `19701101T020000`)
fn parse_transition_time(raw: &str) -> Option<(u32, u32)> {
    let t = raw.find('T')? + 1;
    let hour = raw.get(t..t + 2)?.parse().ok()?;
    let minute = raw.get(t + 2..t + 4)?.parse().ok()?;
    Some((hour, minute))
}

/// Decode a `FREQ=YEARLY;BYMONTH=3;BYDAY=2SU` style recurrence into a [`YearlyRule`]
fn parse_yearly_rrule(raw: &str, time: Option<(u32, u32)>) -> Option<YearlyRule> {
    let mut yearly = false;
    let mut month = None;
    let mut byday = None;

    for part in raw.split(';') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("FREQ"), Some(value)) => yearly = value == "YEARLY",
            (Some("BYMONTH"), Some(value)) => month = value.parse::<u32>().ok(),
            (Some("BYDAY"), Some(value)) => byday = parse_byday(value),
            _ => {}
        }
    }

    if !yearly {
        return None;
    }
    let (week, weekday) = byday?;
    let (hour, minute) = time.unwrap_or((2, 0));
    Some(YearlyRule {
        month: month?,
        week,
        weekday,
        hour,
        minute,
    })
}

/// Decode a BYDAY value like `1SU`, `2SU`, `-1SU` or plain `SU`
fn parse_byday(raw: &str) -> Option<(i8, Weekday)> {
    let split = raw.len().checked_sub(2)?;
    let (ordinal, day) = raw.split_at(split);

    let week: i8 = if ordinal.is_empty() {
        1
    } else {
        ordinal.parse().ok()?
    };
    if week == 0 || week < -1 || week > 5 {
        return None;
    }

    let weekday = match day {
        "MO" => Weekday::Mon,
        "TU" => Weekday::Tue,
        "WE" => Weekday::Wed,
        "TH" => Weekday::Thu,
        "FR" => Weekday::Fri,
        "SA" => Weekday::Sat,
        "SU" => Weekday::Sun,
        _ => return None,
    };

    Some((week, weekday))
}

fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let shift = (weekday.num_days_from_monday() + 7 - first.weekday().num_days_from_monday()) % 7;
    let day = 1 + shift + 7 * (u32::from(n) - 1);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    let shift = (last.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    last.checked_sub_signed(Duration::days(i64::from(shift)))
}
