use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::error;
use phf_macros::phf_ordered_map;
use rusqlite::{params, types::Type, Connection, Row};
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::database::Database;
use crate::error::AppError;
use crate::query::{
    fetch_page, ColMap, ColSpec, ColType, FilterField, ListRequest, Page, Record, TableSpec,
};
use crate::utils::Utils;

pub const TASKS_QUERY_COLS: ColMap = phf_ordered_map! {
    "id" => ColSpec::new("id", ColType::Id),
    "code" => ColSpec::new("code", ColType::Text),
    "title" => ColSpec::new("title", ColType::Text),
    "status" => ColSpec::new("status", ColType::Enum),
    "label" => ColSpec::new("label", ColType::Enum),
    "priority" => ColSpec::new("priority", ColType::Enum),
    "createdAt" => ColSpec::new("created_at", ColType::Date),
    "updatedAt" => ColSpec::new("updated_at", ColType::Date),
};

pub static TASKS_TABLE: TableSpec = TableSpec {
    table: "tasks",
    cols: &TASKS_QUERY_COLS,
    filter_fields: &[
        FilterField::text("title", "title"),
        FilterField::select("status", "status"),
        FilterField::select("priority", "priority"),
        FilterField::date_range("from", "to", "createdAt"),
    ],
    default_sort: "createdAt",
    primary_key: "id",
};

#[derive(
    AsRefStr, EnumIter, EnumString, Debug, Display, PartialEq, Eq, Copy, Clone, Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Canceled,
}

#[derive(
    AsRefStr, EnumIter, EnumString, Debug, Display, PartialEq, Eq, Copy, Clone, Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskLabel {
    Bug,
    Feature,
    Enhancement,
    Documentation,
}

#[derive(
    AsRefStr, EnumIter, EnumString, Debug, Display, PartialEq, Eq, Copy, Clone, Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub code: String,
    pub title: Option<String>,
    pub status: TaskStatus,
    pub label: TaskLabel,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub count: i64,
}

fn get_enum<E>(row: &Row, name: &str) -> rusqlite::Result<E>
where
    E: FromStr<Err = strum::ParseError>,
{
    let value: String = row.get(name)?;
    E::from_str(&value).map_err(|e| {
        let idx = row.as_ref().column_index(name).unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

impl Record for Task {
    fn table() -> &'static TableSpec {
        &TASKS_TABLE
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Task {
            id: row.get("id")?,
            code: row.get("code")?,
            title: row.get("title")?,
            status: get_enum(row, "status")?,
            label: get_enum(row, "label")?,
            priority: get_enum(row, "priority")?,
            created_at: Utils::row_timestamp(row, "created_at")?,
            updated_at: Utils::row_opt_timestamp(row, "updated_at")?,
        })
    }
}

impl Task {
    /// Lists one page of tasks. Never fails: errors come back as an empty page.
    pub fn list(db: &Database, request: &ListRequest) -> Page<Task> {
        fetch_page(db, request)
    }

    pub fn insert(&self, conn: &Connection) -> Result<(), AppError> {
        conn.execute(
            "INSERT INTO tasks (id, code, title, status, label, priority, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                self.id,
                self.code,
                self.title,
                self.status.as_ref(),
                self.label.as_ref(),
                self.priority.as_ref(),
                self.created_at.timestamp(),
                self.updated_at.map(|dt| dt.timestamp()),
            ],
        )?;
        Ok(())
    }

    /// Number of tasks per status; empty when the counts can't be read.
    pub fn counts_by_status(db: &Database) -> Vec<StatusCount> {
        Self::try_counts_by(db, "status", |row| {
            Ok(StatusCount {
                status: get_enum(row, "status")?,
                count: row.get("count")?,
            })
        })
        .unwrap_or_else(|e| {
            error!("Error counting tasks by status: {}", e);
            Vec::new()
        })
    }

    /// Number of tasks per priority; empty when the counts can't be read.
    pub fn counts_by_priority(db: &Database) -> Vec<PriorityCount> {
        Self::try_counts_by(db, "priority", |row| {
            Ok(PriorityCount {
                priority: get_enum(row, "priority")?,
                count: row.get("count")?,
            })
        })
        .unwrap_or_else(|e| {
            error!("Error counting tasks by priority: {}", e);
            Vec::new()
        })
    }

    fn try_counts_by<T, F>(db: &Database, col_name: &str, map_row: F) -> Result<Vec<T>, AppError>
    where
        F: FnMut(&Row) -> rusqlite::Result<T>,
    {
        let col_db = TASKS_TABLE.col_name_to_db(col_name).ok_or_else(|| {
            AppError::Error(format!("Column not found: '{col_name}' in table 'tasks'"))
        })?;

        let conn = db.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {col_db}, COUNT(*) AS count FROM tasks GROUP BY {col_db} ORDER BY {col_db}"
        ))?;

        let rows = stmt.query_map([], map_row)?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }

        Ok(counts)
    }
}
