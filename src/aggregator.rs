//! This module turns tasks and external feeds into displayable calendar events
//!
//! Each source is converted independently: a failing feed produces a [`FeedError`] that
//! the caller logs and swallows, it never contaminates the other sources or the user's
//! own tasks.

use chrono::Duration;

use crate::error::FeedError;
use crate::event::{DisplayEvent, EventResource};
use crate::ical;
use crate::ical::timezone::ZoneRegistry;
use crate::source::{normalize_feed_url, CalendarSource};
use crate::task::Task;
use crate::traits::FeedFetcher;

/// Map a task to its calendar event, if it has a due date.
///
/// Tasks have no native end time, so the event covers a synthetic one-hour window
/// starting at the due instant.
pub fn task_event(task: &Task) -> Option<DisplayEvent> {
    let due_date = match task.due_date {
        None => return None,
        Some(due_date) => due_date,
    };

    Some(DisplayEvent {
        id: task.id.clone(),
        title: task.title.clone(),
        start: due_date,
        end: due_date + Duration::hours(1),
        all_day: false,
        resource: EventResource::Task {
            priority: task.priority,
            status: task.status,
        },
    })
}

/// Fetch one registered source and convert its feed into display events.
///
/// The feed gets a fresh [`ZoneRegistry`] (fallback zone first, then the feed's own
/// VTIMEZONEs), so one feed's zone definitions cannot leak into another's.
pub async fn collect_source_events<F: FeedFetcher + ?Sized>(
    fetcher: &F,
    source: &CalendarSource,
) -> Result<Vec<DisplayEvent>, FeedError> {
    let url = normalize_feed_url(&source.url)?;
    let body = fetcher.fetch(&url).await?;

    let mut zones = ZoneRegistry::with_fallback();
    let feed_events = ical::parse_feed(&body, &mut zones)?;

    Ok(feed_events
        .into_iter()
        .map(|event| DisplayEvent {
            // prefixing with the source id keeps identical UIDs across feeds apart
            id: format!("{}-{}", source.id, event.uid),
            title: event.summary.unwrap_or_default(),
            start: event.start,
            end: event.end,
            all_day: event.all_day,
            resource: EventResource::Calendar {
                color: source.color.clone(),
                source_id: source.id.clone(),
            },
        })
        .collect())
}
