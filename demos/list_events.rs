//! Seeds a small store, registers a real iCal feed, and prints the merged calendar view.
//!
//! Pass a feed URL as the first argument, or let it default to the public US holidays
//! feed. `webcal://` URLs work too.

use chrono::{Duration, Utc};

use corkboard::agenda::{NewSource, NewTask};
use corkboard::fetch::HttpFetcher;
use corkboard::store::JsonStore;
use corkboard::{Agenda, Identity};

const DEFAULT_FEED: &str = "https://www.mozilla.org/media/caldata/USHolidays.ics";

#[tokio::main]
async fn main() {
    env_logger::init();

    let feed_url = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_FEED.to_string());
    let douglas = Identity::user("demo-user");

    let agenda = Agenda::new(JsonStore::new(), HttpFetcher::new());

    agenda
        .create_task(
            &douglas,
            NewTask {
                title: "Water the plants".to_string(),
                due_date: Some(Utc::now() + Duration::hours(3)),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    if let Err(err) = agenda
        .add_source(
            &douglas,
            NewSource {
                name: "External feed".to_string(),
                url: feed_url,
                kind: "web_ical".to_string(),
                color: Some("#4682b4".to_string()),
            },
        )
        .await
    {
        log::error!("Unable to register the feed: {}", err);
    }

    let events = agenda.list_events(&douglas).await.unwrap();
    println!("---- {} events ----", events.len());
    for event in &events {
        let day_marker = if event.all_day { " (all day)" } else { "" };
        println!("  {} -> {}  {}{}", event.start, event.end, event.title, day_marker);
    }
}
