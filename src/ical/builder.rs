//! A module to build iCal files
//!
//! The calendar view is a one-way street (feeds come in), but users can also export their
//! own due-dated tasks as a feed other calendar apps can subscribe to.

use chrono::{DateTime, Duration, Utc};
use ics::properties::{Description, DtEnd, DtStart, Summary};
use ics::{Event, ICalendar};

use crate::task::Task;

/// Build an iCal document from a user's tasks.
///
/// Only tasks with a due date are exported: each becomes a VEVENT covering the same
/// one-hour window the aggregated calendar view shows for it.
pub fn build_feed(tasks: &[Task]) -> String {
    let mut calendar = ICalendar::new("2.0", super::default_prod_id());

    for task in tasks {
        let due_date = match task.due_date {
            None => continue,
            Some(due_date) => due_date,
        };

        let mut event = Event::new(task.id.clone(), format_date_time(&task.updated_at));
        event.push(Summary::new(task.title.clone()));
        if let Some(description) = &task.description {
            event.push(Description::new(description.clone()));
        }
        event.push(DtStart::new(format_date_time(&due_date)));
        event.push(DtEnd::new(format_date_time(&(due_date + Duration::hours(1)))));

        calendar.add_event(event);
    }

    calendar.to_string()
}

fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
