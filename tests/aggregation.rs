
use fixtures::*;

use chrono::Duration;

use corkboard::store::JsonStore;
use corkboard::traits::TaskStore;
use corkboard::{Agenda, EventResource, TaskPriority, TaskStatus};

#[tokio::test]
async fn test_task_events_cover_a_one_hour_window() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let due = at(2024, 6, 15, 13, 0);
    let store = JsonStore::new();
    let task = store.insert_task(task_due(&douglas, "Water the plants", due)).await.unwrap();
    // tasks without a due date never show up in the calendar
    store.insert_task(corkboard::Task::new(&douglas.user_id, "Some day maybe")).await.unwrap();

    let agenda = Agenda::new(store, StaticFetcher::new());
    let events = agenda.list_events(&douglas).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, task.id);
    assert_eq!(events[0].start, due);
    assert_eq!(events[0].end, due + Duration::hours(1));
    assert_eq!(events[0].all_day, false);
    assert_eq!(
        events[0].resource,
        EventResource::Task {
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
        }
    );
}

#[tokio::test]
async fn test_floating_times_resolve_in_new_york() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    store
        .insert_source(source_created_at(&douglas, "Floating", "https://feeds.example/floating.ics", at(2024, 1, 1, 0, 0)))
        .await
        .unwrap();

    let fetcher = StaticFetcher::new().with_body("https://feeds.example/floating.ics", FEED_FLOATING);
    let agenda = Agenda::new(store, fetcher);
    let events = agenda.list_events(&douglas).await.unwrap();

    // 09:00 floating on June 15 is EDT (UTC-4)
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start, at(2024, 6, 15, 13, 0));
}

#[tokio::test]
async fn test_all_day_detection() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    store
        .insert_source(source_created_at(&douglas, "Mixed", "https://feeds.example/mixed.ics", at(2024, 1, 1, 0, 0)))
        .await
        .unwrap();

    let fetcher = StaticFetcher::new().with_body("https://feeds.example/mixed.ics", FEED_MIXED_DAYS);
    let agenda = Agenda::new(store, fetcher);
    let events = agenda.list_events(&douglas).await.unwrap();

    assert_eq!(events.len(), 2);
    let whole_day = events.iter().find(|e| e.id.ends_with("whole-day")).unwrap();
    assert_eq!(whole_day.all_day, true);
    let timed = events.iter().find(|e| e.id.ends_with("timed")).unwrap();
    assert_eq!(timed.all_day, false);
}

#[tokio::test]
async fn test_one_broken_source_does_not_break_the_others() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let due = at(2024, 6, 15, 8, 0);
    let store = JsonStore::new();
    let task = store.insert_task(task_due(&douglas, "Before everything", due)).await.unwrap();

    let alpha = store
        .insert_source(source_created_at(&douglas, "Alpha", "https://feeds.example/alpha.ics", at(2024, 1, 1, 0, 0)))
        .await
        .unwrap();
    store
        .insert_source(source_created_at(&douglas, "Beta", "https://feeds.example/beta.ics", at(2024, 1, 2, 0, 0)))
        .await
        .unwrap();
    let gamma = store
        .insert_source(source_created_at(&douglas, "Gamma", "https://feeds.example/gamma.ics", at(2024, 1, 3, 0, 0)))
        .await
        .unwrap();

    // the middle source answers HTTP 500
    let fetcher = StaticFetcher::new()
        .with_body("https://feeds.example/alpha.ics", FEED_TWO_EVENTS)
        .with_status("https://feeds.example/beta.ics", 500)
        .with_body("https://feeds.example/gamma.ics", FEED_ONE_EVENT);

    let agenda = Agenda::new(store, fetcher);
    let events = agenda.list_events(&douglas).await.unwrap();

    // internal task first, then the surviving sources in registration order
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].id, task.id);
    assert_eq!(events[1].id, format!("{}-alpha-1", alpha.id));
    assert_eq!(events[2].id, format!("{}-alpha-2", alpha.id));
    assert_eq!(events[3].id, format!("{}-gamma-1", gamma.id));
}

#[tokio::test]
async fn test_missing_source_table_degrades_to_tasks_only() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let due = at(2024, 6, 15, 13, 0);
    let store = JsonStore::new().without_source_table();
    let task = store.insert_task(task_due(&douglas, "Water the plants", due)).await.unwrap();

    let agenda = Agenda::new(store, StaticFetcher::new());
    let events = agenda.list_events(&douglas).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, task.id);
}

#[tokio::test]
async fn test_webcal_urls_are_fetched_over_https() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    store
        .insert_source(source_created_at(&douglas, "Webcal", "webcal://example.com/feed.ics", at(2024, 1, 1, 0, 0)))
        .await
        .unwrap();

    // the canned body is only reachable under the https scheme
    let fetcher = StaticFetcher::new().with_body("https://example.com/feed.ics", FEED_ONE_EVENT);
    let agenda = Agenda::new(store, fetcher);
    let events = agenda.list_events(&douglas).await.unwrap();

    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_feed_events_carry_their_source_display_data() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    let mut source = source_created_at(&douglas, "Colored", "https://feeds.example/colored.ics", at(2024, 1, 1, 0, 0));
    source.color = Some("#88cc00".to_string());
    let source = store.insert_source(source).await.unwrap();

    let fetcher = StaticFetcher::new().with_body("https://feeds.example/colored.ics", FEED_ONE_EVENT);
    let agenda = Agenda::new(store, fetcher);
    let events = agenda.list_events(&douglas).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, format!("{}-gamma-1", source.id));
    assert_eq!(
        events[0].resource,
        EventResource::Calendar {
            color: Some("#88cc00".to_string()),
            source_id: source.id.clone(),
        }
    );
}

#[tokio::test]
async fn test_feed_declared_zones_override_the_fallback() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    store
        .insert_source(source_created_at(&douglas, "Zoned", "https://feeds.example/zoned.ics", at(2024, 1, 1, 0, 0)))
        .await
        .unwrap();

    let fetcher = StaticFetcher::new().with_body("https://feeds.example/zoned.ics", FEED_CUSTOM_ZONE);
    let agenda = Agenda::new(store, fetcher);
    let events = agenda.list_events(&douglas).await.unwrap();

    // 09:00 in the feed's own fixed UTC+1 zone
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start, at(2024, 6, 15, 8, 0));
}

#[tokio::test]
async fn test_users_only_see_their_own_calendar() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let martha = martha();
    let store = JsonStore::new();
    store.insert_task(task_due(&douglas, "Douglas' task", at(2024, 6, 15, 13, 0))).await.unwrap();
    store
        .insert_source(source_created_at(&douglas, "Douglas' feed", "https://feeds.example/alpha.ics", at(2024, 1, 1, 0, 0)))
        .await
        .unwrap();

    let fetcher = StaticFetcher::new().with_body("https://feeds.example/alpha.ics", FEED_TWO_EVENTS);
    let agenda = Agenda::new(store, fetcher);

    let martha_events = agenda.list_events(&martha).await.unwrap();
    assert!(martha_events.is_empty());
}
