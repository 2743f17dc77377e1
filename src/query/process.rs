use std::fmt;

use log::{error, warn, Level};
use logging_timer::timer;
use rusqlite::{Row, ToSql};

use crate::{database::Database, error::AppError};

use super::{columns::TableSpec, order::Order, page::Page, request::ListRequest};

/// A row type that can be listed page by page.
pub trait Record: Sized {
    fn table() -> &'static TableSpec;
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// The combined predicate shared by the page query and the count query.
#[derive(Default)]
pub struct WhereClause {
    sql: String,
    params: Vec<Box<dyn ToSql>>,
}

impl fmt::Debug for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhereClause")
            .field("sql", &self.sql)
            .field("params", &self.params.len())
            .finish()
    }
}

impl WhereClause {
    /// Builds one predicate per filter field present in the request and joins them
    /// with the request's operator. Fields whose value can't be turned into a
    /// predicate are left out.
    pub fn build(request: &ListRequest, table: &TableSpec) -> Self {
        let mut where_clause = WhereClause::default();
        let mut preds: Vec<String> = Vec::new();

        for field in table.filter_fields {
            let filter = match field.build_filter(request, table) {
                Ok(Some(filter)) => filter,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Ignoring filter '{}' on '{}': {}", field.param, table.table, e);
                    continue;
                }
            };

            match filter.to_predicate_parts() {
                Ok((pred_str, pred_vec)) => {
                    preds.push(pred_str);
                    where_clause.params.extend(pred_vec);
                }
                Err(e) => warn!("Ignoring filter '{}' on '{}': {}", field.param, table.table, e),
            }
        }

        if !preds.is_empty() {
            where_clause.sql = format!("\nWHERE {}", preds.join(request.operator.joiner()));
        }

        where_clause
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|b| &**b).collect()
    }
}

/// A fully composed page query for one table.
#[derive(Debug)]
pub struct PageQuery {
    table: &'static TableSpec,
    where_clause: WhereClause,
    order: Order,
    limit: i64,
    offset: i64,
}

impl PageQuery {
    /// Offsets past SQLite's integer range are clamped: they select no rows, but the
    /// count still runs.
    pub fn new(table: &'static TableSpec, request: &ListRequest) -> Self {
        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);

        PageQuery {
            table,
            where_clause: WhereClause::build(request, table),
            order: Order::from_sort_param(request.sort.as_deref(), table),
            limit: i64::from(request.per_page),
            offset,
        }
    }

    pub fn select_sql(&self) -> String {
        format!(
            "SELECT {} FROM {}{}{}\nLIMIT ? OFFSET ?",
            self.table.cols_as_select_list(),
            self.table.table,
            self.where_clause.sql(),
            self.order.to_order_clause(),
        )
    }

    pub fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {}{}",
            self.table.table,
            self.where_clause.sql()
        )
    }

    fn select_params(&self) -> Vec<&dyn ToSql> {
        let mut params = self.where_clause.params();
        params.push(&self.limit);
        params.push(&self.offset);
        params
    }

    /// Runs the page query and the count query inside one read transaction so the
    /// rows and the total come from the same snapshot.
    pub fn execute<T: Record>(&self, db: &Database) -> Result<(Vec<T>, u64), AppError> {
        let mut conn = db.get_connection()?;

        Database::read_transaction(&mut conn, |tx| {
            let mut stmt = tx.prepare(&self.select_sql())?;
            let rows = stmt.query_map(&self.select_params()[..], T::from_row)?;

            let mut data = Vec::new();
            for row in rows {
                data.push(row?);
            }

            let total: i64 = tx.query_row(
                &self.count_sql(),
                &self.where_clause.params()[..],
                |row| row.get(0),
            )?;

            Ok((data, u64::try_from(total).unwrap_or_default()))
        })
    }
}

/// Fetches one page of `T`, surfacing any failure.
pub fn try_fetch_page<T: Record>(db: &Database, request: &ListRequest) -> Result<Page<T>, AppError> {
    let table = T::table();
    let _tmr = timer!(Level::Trace; "fetch_page", "{}", table.table);

    let query = PageQuery::new(table, request);
    let (data, total) = query.execute::<T>(db)?;

    Ok(Page::new(data, total, request.per_page))
}

/// Fetches one page of `T`. Failures are logged and turned into an empty page so the
/// table renders empty instead of failing.
pub fn fetch_page<T: Record>(db: &Database, request: &ListRequest) -> Page<T> {
    match try_fetch_page(db, request) {
        Ok(page) => page,
        Err(e) => {
            error!("Error fetching {}: {}", T::table().table, e);
            Page::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addresses::{DeliveryAddress, ADDRESSES_TABLE};
    use crate::database::test_support::temp_db;
    use crate::query::Operator;
    use crate::tasks::{Task, TaskLabel, TaskPriority, TaskStatus, TASKS_TABLE};
    use pretty_assertions::assert_eq;

    fn task(n: i64, status: TaskStatus, priority: TaskPriority, created_at: i64) -> Task {
        Task {
            id: format!("t{n:02}"),
            code: format!("TASK-{n:04}"),
            title: Some(format!("Task number {n}")),
            status,
            label: TaskLabel::Feature,
            priority,
            created_at: crate::utils::Utils::timestamp_to_utc(created_at).unwrap(),
            updated_at: None,
        }
    }

    /// Nine tasks, one per hour starting 2023-06-01, alternating status and priority.
    fn nine_tasks(db: &Database) -> Vec<Task> {
        let base = 1_685_577_600; // 2023-06-01T00:00:00Z
        let tasks: Vec<Task> = (1..=9)
            .map(|n| {
                let status = if n % 2 == 0 { TaskStatus::Done } else { TaskStatus::Todo };
                let priority = if n <= 3 { TaskPriority::High } else { TaskPriority::Low };
                task(n, status, priority, base + n * 3600)
            })
            .collect();

        let mut conn = db.get_connection().unwrap();
        Database::immediate_transaction(&mut conn, |tx| {
            for t in &tasks {
                t.insert(tx)?;
            }
            Ok(())
        })
        .unwrap();

        tasks
    }

    fn ids(page: &Page<Task>) -> Vec<&str> {
        page.data.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_select_sql_without_filters() {
        let request = ListRequest::default();
        let query = PageQuery::new(&ADDRESSES_TABLE, &request);
        assert_eq!(
            query.select_sql(),
            "SELECT id, country, full_address, city, street, zip_code, created_at, updated_at FROM delivery_addresses\nORDER BY created_at DESC, id DESC\nLIMIT ? OFFSET ?"
        );
        assert_eq!(query.count_sql(), "SELECT COUNT(*) FROM delivery_addresses");
    }

    #[test]
    fn test_where_clause_shared_by_both_queries() {
        let request = ListRequest::default()
            .with_operator(Operator::Or)
            .with_filter("country", "Canada,Japan")
            .with_filter("city", "Tokyo");
        let query = PageQuery::new(&ADDRESSES_TABLE, &request);

        let expected_where = "\nWHERE (country IN (?, ?)) OR (city IN (?))";
        assert_eq!(query.where_clause.sql(), expected_where);
        assert!(query.select_sql().contains(expected_where));
        assert!(query.count_sql().ends_with(expected_where));
        assert_eq!(query.where_clause.params().len(), 3);
        assert_eq!(query.select_params().len(), 5);
    }

    #[test]
    fn test_bad_filter_is_omitted() {
        let request = ListRequest::default()
            .with_filter("title", "~eq")
            .with_filter("status", "todo");
        let where_clause = WhereClause::build(&request, &TASKS_TABLE);
        assert_eq!(where_clause.sql(), "\nWHERE (status IN (?))");
    }

    #[test]
    fn test_undeclared_params_are_ignored() {
        let request = ListRequest::default().with_filter("title", "x");
        let where_clause = WhereClause::build(&request, &ADDRESSES_TABLE);
        assert_eq!(where_clause.sql(), "");
    }

    #[test]
    fn test_nine_rows_two_pages() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);

        let first: Page<Task> = fetch_page(&db, &ListRequest::new(1, 5).unwrap());
        assert_eq!(first.total, 9);
        assert_eq!(first.page_count, 2);
        assert_eq!(first.data.len(), 5);
        assert_eq!(ids(&first), vec!["t09", "t08", "t07", "t06", "t05"]);

        let second: Page<Task> = fetch_page(&db, &ListRequest::new(2, 5).unwrap());
        assert_eq!(second.page_count, 2);
        assert_eq!(ids(&second), vec!["t04", "t03", "t02", "t01"]);

        let beyond: Page<Task> = fetch_page(&db, &ListRequest::new(3, 5).unwrap());
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.total, 9);
        assert_eq!(beyond.page_count, 2);
    }

    #[test]
    fn test_fetch_is_idempotent() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);

        let request = ListRequest::new(1, 4)
            .unwrap()
            .with_sort("status.asc")
            .with_filter("priority", "low");
        let first: Page<Task> = fetch_page(&db, &request);
        let second: Page<Task> = fetch_page(&db, &request);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_sort_matches_default_order() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);

        let default: Page<Task> = fetch_page(&db, &ListRequest::default());
        let unknown: Page<Task> =
            fetch_page(&db, &ListRequest::default().with_sort("nonexistent.asc"));
        assert_eq!(ids(&unknown), ids(&default));
        assert_eq!(ids(&default)[0], "t09");
    }

    #[test]
    fn test_sort_ascending() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);

        let page: Page<Task> =
            fetch_page(&db, &ListRequest::new(1, 3).unwrap().with_sort("createdAt.asc"));
        assert_eq!(ids(&page), vec!["t01", "t02", "t03"]);
    }

    #[test]
    fn test_and_is_intersection_or_is_union() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);

        // status=done -> t02, t04, t06, t08; priority=high -> t01, t02, t03
        let and_page: Page<Task> = fetch_page(
            &db,
            &ListRequest::default()
                .with_filter("status", "done")
                .with_filter("priority", "high"),
        );
        assert_eq!(ids(&and_page), vec!["t02"]);

        let or_page: Page<Task> = fetch_page(
            &db,
            &ListRequest::default()
                .with_operator(Operator::Or)
                .with_filter("status", "done")
                .with_filter("priority", "high"),
        );
        assert_eq!(or_page.total, 6);
        assert_eq!(ids(&or_page), vec!["t08", "t06", "t04", "t03", "t02", "t01"]);
    }

    #[test]
    fn test_disjoint_and_is_empty() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);

        let page: Page<Task> = fetch_page(
            &db,
            &ListRequest::default()
                .with_filter("status", "done")
                .with_filter("title", "number 9"),
        );
        assert_eq!(page, Page::empty());
    }

    #[test]
    fn test_failure_returns_empty_page() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);
        db.get_connection()
            .unwrap()
            .execute_batch("DROP TABLE tasks;")
            .unwrap();

        let result: Result<Page<Task>, AppError> = try_fetch_page(&db, &ListRequest::default());
        assert!(result.is_err());

        let page: Page<Task> = fetch_page(&db, &ListRequest::default());
        assert_eq!(page, Page::empty());
    }

    #[test]
    fn test_huge_offset_keeps_the_total() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);

        let request = ListRequest::new(u32::MAX, u32::MAX).unwrap();
        let query = PageQuery::new(&TASKS_TABLE, &request);
        assert_eq!(query.offset, i64::MAX);

        let page = try_fetch_page::<Task>(&db, &request).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 9);
        assert_eq!(page.page_count, 1);
        assert_eq!(fetch_page::<Task>(&db, &request), page);

        let filtered = ListRequest::new(u32::MAX, u32::MAX)
            .unwrap()
            .with_filter("status", "done");
        assert_eq!(fetch_page::<Task>(&db, &filtered).total, 4);
    }

    #[test]
    fn test_addresses_use_their_own_table() {
        let (_dir, db) = temp_db();
        nine_tasks(&db);

        let page: Page<DeliveryAddress> = fetch_page(&db, &ListRequest::default());
        assert_eq!(page, Page::empty());
    }
}
