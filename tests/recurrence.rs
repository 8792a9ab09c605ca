
use fixtures::*;

use corkboard::agenda::{NewSource, NewTask};
use corkboard::error::AgendaError;
use corkboard::recurrence::RecurrenceFreq;
use corkboard::store::JsonStore;
use corkboard::traits::TaskStore;
use corkboard::{Agenda, TaskPatch, TaskStatus};

fn complete() -> TaskPatch {
    TaskPatch {
        status: Some(TaskStatus::Completed),
        ..TaskPatch::default()
    }
}

#[tokio::test]
async fn test_completing_a_recurring_task_spawns_its_successor() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    let task = store
        .insert_task(recurring_task(&douglas, "Take out the bins", at(2024, 1, 15, 9, 0), RecurrenceFreq::Daily, 3))
        .await
        .unwrap();

    let agenda = Agenda::new(store, StaticFetcher::new());
    let outcome = agenda.update_task(&douglas, &task.id, complete()).await.unwrap();

    assert_eq!(outcome.task.status, TaskStatus::Completed);
    assert!(outcome.successor_error.is_none());

    let tasks = agenda.list_tasks(&douglas).await.unwrap();
    assert_eq!(tasks.len(), 2);

    // the completed instance is retained, its successor is pending three days later
    let successor = tasks.iter().find(|t| t.id != task.id).unwrap();
    assert_eq!(successor.status, TaskStatus::Pending);
    assert_eq!(successor.due_date, Some(at(2024, 1, 18, 9, 0)));
    assert_eq!(successor.is_recurring, true);
    assert_eq!(successor.recurrence_pattern, task.recurrence_pattern);
    assert_eq!(successor.title, task.title);
}

#[tokio::test]
async fn test_completing_twice_spawns_only_one_successor() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    let task = store
        .insert_task(recurring_task(&douglas, "Water the plants", at(2024, 1, 15, 9, 0), RecurrenceFreq::Weekly, 2))
        .await
        .unwrap();

    let agenda = Agenda::new(store, StaticFetcher::new());
    agenda.update_task(&douglas, &task.id, complete()).await.unwrap();
    let second = agenda.update_task(&douglas, &task.id, complete()).await.unwrap();

    // re-saving an already-completed task must not lengthen the chain
    assert_eq!(second.task.status, TaskStatus::Completed);
    assert_eq!(agenda.list_tasks(&douglas).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reopening_and_completing_again_continues_the_chain() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    let task = store
        .insert_task(recurring_task(&douglas, "Stand-up notes", at(2024, 1, 15, 9, 0), RecurrenceFreq::Daily, 1))
        .await
        .unwrap();

    let agenda = Agenda::new(store, StaticFetcher::new());
    agenda.update_task(&douglas, &task.id, complete()).await.unwrap();

    let reopen = TaskPatch {
        status: Some(TaskStatus::Pending),
        ..TaskPatch::default()
    };
    agenda.update_task(&douglas, &task.id, reopen).await.unwrap();
    agenda.update_task(&douglas, &task.id, complete()).await.unwrap();

    // each genuine transition into "completed" is one link of the chain
    assert_eq!(agenda.list_tasks(&douglas).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_non_recurring_tasks_complete_without_side_effects() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    let task = store
        .insert_task(task_due(&douglas, "One-shot errand", at(2024, 1, 15, 9, 0)))
        .await
        .unwrap();

    let agenda = Agenda::new(store, StaticFetcher::new());
    let outcome = agenda.update_task(&douglas, &task.id, complete()).await.unwrap();

    assert_eq!(outcome.task.status, TaskStatus::Completed);
    assert_eq!(agenda.list_tasks(&douglas).await.unwrap().len(), 1);
}

#[cfg(feature = "fault_injection")]
#[tokio::test]
async fn test_a_failed_successor_does_not_undo_the_completion() {
    use std::sync::{Arc, Mutex};

    use corkboard::mock_behaviour::MockBehaviour;

    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let mut store = JsonStore::new();
    let task = store
        .insert_task(recurring_task(&douglas, "Backup the fridge", at(2024, 1, 15, 9, 0), RecurrenceFreq::Daily, 1))
        .await
        .unwrap();

    // the next task insertion (the successor) will fail
    store.set_mock_behaviour(Some(Arc::new(Mutex::new(MockBehaviour {
        insert_task_behaviour: (0, 1),
        ..MockBehaviour::default()
    }))));

    let agenda = Agenda::new(store, StaticFetcher::new());
    let outcome = agenda.update_task(&douglas, &task.id, complete()).await.unwrap();

    // the completion stands, the broken chain is reported separately
    assert_eq!(outcome.task.status, TaskStatus::Completed);
    assert!(outcome.successor_error.is_some());
    assert_eq!(agenda.list_tasks(&douglas).await.unwrap().len(), 1);
    assert_eq!(
        agenda.list_tasks(&douglas).await.unwrap()[0].status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn test_only_the_owner_or_an_admin_may_update() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let martha = martha();
    let admin = admin();
    let store = JsonStore::new();
    let task = store
        .insert_task(task_due(&douglas, "Private errand", at(2024, 1, 15, 9, 0)))
        .await
        .unwrap();

    let agenda = Agenda::new(store, StaticFetcher::new());

    match agenda.update_task(&martha, &task.id, complete()).await {
        Err(AgendaError::Forbidden) => {}
        other => panic!("expected Forbidden, got {:?}", other.map(|o| o.task)),
    }

    let outcome = agenda.update_task(&admin, &task.id, complete()).await.unwrap();
    assert_eq!(outcome.task.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_assigning_tasks_to_others_is_admin_only() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let martha = martha();
    let admin = admin();
    let agenda = Agenda::new(JsonStore::new(), StaticFetcher::new());

    let sneaky = NewTask {
        title: "Do my chores".to_string(),
        assignee: Some(martha.user_id.clone()),
        ..NewTask::default()
    };
    match agenda.create_task(&douglas, sneaky).await {
        Err(AgendaError::Forbidden) => {}
        other => panic!("expected Forbidden, got {:?}", other),
    }

    let assigned = NewTask {
        title: "Review the report".to_string(),
        assignee: Some(martha.user_id.clone()),
        ..NewTask::default()
    };
    let task = agenda.create_task(&admin, assigned).await.unwrap();
    assert_eq!(task.user_id, martha.user_id);
    assert_eq!(agenda.list_tasks(&martha).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_adding_a_source_without_the_table_asks_for_setup() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let agenda = Agenda::new(JsonStore::new().without_source_table(), StaticFetcher::new());

    let new_source = NewSource {
        name: "Holidays".to_string(),
        url: "https://example.com/holidays.ics".to_string(),
        kind: "web_ical".to_string(),
        color: None,
    };
    match agenda.add_source(&douglas, new_source).await {
        Err(AgendaError::SetupRequired(message)) => {
            assert!(message.contains("calendar_sources"));
        }
        other => panic!("expected SetupRequired, got {:?}", other),
    }
}

#[tokio::test]
async fn test_source_registration_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let martha = martha();
    let agenda = Agenda::new(JsonStore::new(), StaticFetcher::new());

    let created = agenda
        .add_source(
            &douglas,
            NewSource {
                name: "Holidays".to_string(),
                url: "webcal://example.com/holidays.ics".to_string(),
                kind: "web_ical".to_string(),
                color: Some("tomato".to_string()),
            },
        )
        .await
        .unwrap();

    let sources = agenda.list_sources(&douglas).await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, created.id);

    // another user can neither see nor delete it
    assert!(agenda.list_sources(&martha).await.unwrap().is_empty());
    match agenda.delete_source(&martha, &created.id).await {
        Err(AgendaError::Forbidden) => {}
        other => panic!("expected Forbidden, got {:?}", other),
    }

    agenda.delete_source(&douglas, &created.id).await.unwrap();
    assert!(agenda.list_sources(&douglas).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_source_inputs_are_rejected() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let agenda = Agenda::new(JsonStore::new(), StaticFetcher::new());

    let bad_url = NewSource {
        name: "Broken".to_string(),
        url: "definitely not a url".to_string(),
        kind: "web_ical".to_string(),
        color: None,
    };
    match agenda.add_source(&douglas, bad_url).await {
        Err(AgendaError::InvalidInput(_)) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }

    let bad_color = NewSource {
        name: "Garish".to_string(),
        url: "https://example.com/feed.ics".to_string(),
        kind: "web_ical".to_string(),
        color: Some("not-a-color".to_string()),
    };
    match agenda.add_source(&douglas, bad_color).await {
        Err(AgendaError::InvalidInput(_)) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exported_feed_mirrors_the_calendar_window() {
    let _ = env_logger::builder().is_test(true).try_init();

    let douglas = douglas();
    let store = JsonStore::new();
    let task = store
        .insert_task(task_due(&douglas, "Dentist", at(2024, 6, 15, 13, 0)))
        .await
        .unwrap();

    let agenda = Agenda::new(store, StaticFetcher::new());
    let feed = agenda.export_feed(&douglas).await.unwrap();

    assert!(feed.contains(&format!("UID:{}", task.id)));
    assert!(feed.contains("DTSTART:20240615T130000Z"));
    assert!(feed.contains("DTEND:20240615T140000Z"));
}
