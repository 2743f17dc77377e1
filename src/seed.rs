use chrono::{DateTime, Duration, Utc};
use log::info;
use strum::IntoEnumIterator;

use crate::addresses::DeliveryAddress;
use crate::database::Database;
use crate::error::AppError;
use crate::tasks::{Task, TaskLabel, TaskPriority, TaskStatus};

pub const DEFAULT_TASK_COUNT: usize = 100;

const TITLE_VERBS: [&str; 8] = [
    "Refactor", "Document", "Fix", "Review", "Migrate", "Benchmark", "Test", "Design",
];
const TITLE_NOUNS: [&str; 10] = [
    "checkout flow",
    "address lookup",
    "delivery slots",
    "courier API client",
    "invoice export",
    "zip code validation",
    "driver assignment",
    "route planner",
    "admin table filters",
    "notification queue",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub addresses: usize,
    pub tasks: usize,
}

fn utc(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn address(
    id: &str,
    created_at: &str,
    updated_at: Option<&str>,
    country: &str,
    full_address: &str,
    city: &str,
    zip_code: &str,
    street: &str,
) -> DeliveryAddress {
    DeliveryAddress {
        id: id.to_owned(),
        country: country.to_owned(),
        full_address: full_address.to_owned(),
        city: city.to_owned(),
        street: street.to_owned(),
        zip_code: zip_code.to_owned(),
        created_at: utc(created_at),
        updated_at: updated_at.map(utc),
    }
}

/// The sample rows the admin table ships with.
pub fn sample_addresses() -> Vec<DeliveryAddress> {
    vec![
        address(
            "0987654321",
            "2023-07-10T08:00:00Z",
            None,
            "Canada",
            "567 Maple Ave, Toronto, ON M5V 2T6, Canada",
            "Toronto",
            "M5V 2T6",
            "567 Maple Ave",
        ),
        address(
            "1122334455",
            "2022-11-20T14:15:00Z",
            Some("2023-02-28T16:20:00Z"),
            "Australia",
            "432 Kangaroo Rd, Sydney, NSW 2000, Australia",
            "Sydney",
            "2000",
            "432 Kangaroo Rd",
        ),
        address(
            "6677889900",
            "2024-01-05T09:45:00Z",
            None,
            "United Kingdom",
            "89 Baker St, London W1U 6RF, United Kingdom",
            "London",
            "W1U 6RF",
            "89 Baker St",
        ),
        address(
            "4455667788",
            "2021-05-25T11:30:00Z",
            Some("2021-09-10T10:00:00Z"),
            "Germany",
            "10 Hauptstraße, Berlin 10115, Germany",
            "Berlin",
            "10115",
            "10 Hauptstraße",
        ),
        address(
            "2233445566",
            "2023-03-12T13:50:00Z",
            Some("2023-06-22T09:25:00Z"),
            "Japan",
            "12 Sakura St, Tokyo 100-0001, Japan",
            "Tokyo",
            "100-0001",
            "12 Sakura St",
        ),
    ]
}

/// Deterministic tasks: statuses, labels and priorities cycle, one task every 29 hours
/// going back from 2024-06-01.
pub fn generated_tasks(count: usize) -> Vec<Task> {
    let statuses: Vec<TaskStatus> = TaskStatus::iter().collect();
    let labels: Vec<TaskLabel> = TaskLabel::iter().collect();
    let priorities: Vec<TaskPriority> = TaskPriority::iter().collect();
    let newest = utc("2024-06-01T00:00:00Z");

    (0..count)
        .map(|i| {
            let n = i + 1;
            let hours_back = i64::try_from(i).unwrap_or_default() * 29;
            let created_at = newest - Duration::hours(hours_back);

            Task {
                id: format!("tsk_{n:06}"),
                code: format!("TASK-{n:04}"),
                title: Some(format!(
                    "{} the {}",
                    TITLE_VERBS[i % TITLE_VERBS.len()],
                    TITLE_NOUNS[i % TITLE_NOUNS.len()]
                )),
                status: statuses[i % statuses.len()],
                label: labels[(i / 2) % labels.len()],
                priority: priorities[(i / 3) % priorities.len()],
                created_at,
                updated_at: (i % 5 == 0).then(|| created_at + Duration::days(2)),
            }
        })
        .collect()
}

/// Loads the sample addresses and `task_count` generated tasks. With `reset`, both
/// tables are emptied first; otherwise rows that already exist are an error.
pub fn seed(db: &Database, task_count: usize, reset: bool) -> Result<SeedSummary, AppError> {
    let addresses = sample_addresses();
    let tasks = generated_tasks(task_count);

    let mut conn = db.get_connection()?;
    Database::immediate_transaction(&mut conn, |tx| {
        if reset {
            tx.execute_batch("DELETE FROM delivery_addresses; DELETE FROM tasks;")?;
        }

        for address in &addresses {
            address.insert(tx)?;
        }
        for task in &tasks {
            task.insert(tx)?;
        }
        Ok(())
    })?;

    let summary = SeedSummary {
        addresses: addresses.len(),
        tasks: tasks.len(),
    };
    info!(
        "Seeded {} addresses and {} tasks",
        summary.addresses, summary.tasks
    );

    Ok(summary)
}
