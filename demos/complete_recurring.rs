//! Completes a recurring task a few times and prints the resulting chain.

use chrono::{TimeZone, Utc};

use corkboard::agenda::NewTask;
use corkboard::fetch::HttpFetcher;
use corkboard::recurrence::RecurrenceFreq;
use corkboard::store::JsonStore;
use corkboard::{Agenda, Identity, RecurrencePattern, TaskPatch, TaskStatus};

#[tokio::main]
async fn main() {
    env_logger::init();

    let douglas = Identity::user("demo-user");
    let agenda = Agenda::new(JsonStore::new(), HttpFetcher::new());

    let mut task = agenda
        .create_task(
            &douglas,
            NewTask {
                title: "Take out the bins".to_string(),
                due_date: Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()),
                is_recurring: true,
                recurrence_pattern: Some(RecurrencePattern::new(RecurrenceFreq::Weekly, 1)),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    // complete three occurrences in a row
    for _ in 0..3 {
        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            ..TaskPatch::default()
        };
        agenda.update_task(&douglas, &task.id, patch).await.unwrap();

        // the successor is not returned by the update, it shows up on the next list
        let tasks = agenda.list_tasks(&douglas).await.unwrap();
        task = tasks
            .into_iter()
            .find(|t| t.status == TaskStatus::Pending)
            .expect("a recurring completion materializes a pending successor");
    }

    println!("---- the chain so far ----");
    for t in agenda.list_tasks(&douglas).await.unwrap() {
        println!("  [{:?}] {} (due {:?})", t.status, t.title, t.due_date);
    }
}
