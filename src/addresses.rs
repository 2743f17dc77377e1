use chrono::{DateTime, Utc};
use phf_macros::phf_ordered_map;
use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::database::Database;
use crate::error::AppError;
use crate::query::{
    fetch_page, ColMap, ColSpec, ColType, FilterField, ListRequest, Page, Record, TableSpec,
};
use crate::utils::Utils;

pub const ADDRESSES_QUERY_COLS: ColMap = phf_ordered_map! {
    "id" => ColSpec::new("id", ColType::Id),
    "country" => ColSpec::new("country", ColType::Text),
    "full_address" => ColSpec::new("full_address", ColType::Text),
    "city" => ColSpec::new("city", ColType::Text),
    "street" => ColSpec::new("street", ColType::Text),
    "zipCode" => ColSpec::new("zip_code", ColType::Text),
    "createdAt" => ColSpec::new("created_at", ColType::Date),
    "updatedAt" => ColSpec::new("updated_at", ColType::Date),
};

pub static ADDRESSES_TABLE: TableSpec = TableSpec {
    table: "delivery_addresses",
    cols: &ADDRESSES_QUERY_COLS,
    filter_fields: &[
        FilterField::select("country", "country"),
        FilterField::select("city", "city"),
        FilterField::select("zipCode", "zipCode"),
    ],
    default_sort: "createdAt",
    primary_key: "id",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub id: String,
    pub country: String,
    #[serde(rename = "full_address")]
    pub full_address: String,
    pub city: String,
    pub street: String,
    pub zip_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for DeliveryAddress {
    fn table() -> &'static TableSpec {
        &ADDRESSES_TABLE
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(DeliveryAddress {
            id: row.get("id")?,
            country: row.get("country")?,
            full_address: row.get("full_address")?,
            city: row.get("city")?,
            street: row.get("street")?,
            zip_code: row.get("zip_code")?,
            created_at: Utils::row_timestamp(row, "created_at")?,
            updated_at: Utils::row_opt_timestamp(row, "updated_at")?,
        })
    }
}

impl DeliveryAddress {
    /// Lists one page of addresses. Never fails: errors come back as an empty page.
    pub fn list(db: &Database, request: &ListRequest) -> Page<DeliveryAddress> {
        fetch_page(db, request)
    }

    pub fn insert(&self, conn: &Connection) -> Result<(), AppError> {
        conn.execute(
            "INSERT INTO delivery_addresses (id, country, full_address, city, street, zip_code, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                self.id,
                self.country,
                self.full_address,
                self.city,
                self.street,
                self.zip_code,
                self.created_at.timestamp(),
                self.updated_at.map(|dt| dt.timestamp()),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::temp_db;
    use crate::query::Operator;
    use crate::seed::sample_addresses;
    use pretty_assertions::assert_eq;

    fn seeded_db() -> (tempfile::TempDir, Database) {
        let (dir, db) = temp_db();
        let mut conn = db.get_connection().unwrap();
        Database::immediate_transaction(&mut conn, |tx| {
            for address in sample_addresses() {
                address.insert(tx)?;
            }
            Ok(())
        })
        .unwrap();
        drop(conn);
        (dir, db)
    }

    fn cities(page: &Page<DeliveryAddress>) -> Vec<&str> {
        page.data.iter().map(|a| a.city.as_str()).collect()
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let (_dir, db) = seeded_db();

        let page = DeliveryAddress::list(&db, &ListRequest::default());
        assert_eq!(page.total, 5);
        assert_eq!(page.page_count, 1);
        assert_eq!(cities(&page), vec!["London", "Toronto", "Tokyo", "Sydney", "Berlin"]);
    }

    #[test]
    fn test_country_filter_accepts_several_values() {
        let (_dir, db) = seeded_db();

        let request = ListRequest::default().with_filter("country", "Japan,Germany");
        let page = DeliveryAddress::list(&db, &request);
        assert_eq!(cities(&page), vec!["Tokyo", "Berlin"]);
    }

    #[test]
    fn test_select_filter_is_exact() {
        let (_dir, db) = seeded_db();

        let request = ListRequest::default().with_filter("city", "Tok");
        let page = DeliveryAddress::list(&db, &request);
        assert_eq!(page, Page::empty());
    }

    #[test]
    fn test_or_across_columns() {
        let (_dir, db) = seeded_db();

        let request = ListRequest::default()
            .with_operator(Operator::Or)
            .with_filter("city", "Sydney")
            .with_filter("zipCode", "W1U 6RF");
        let page = DeliveryAddress::list(&db, &request);
        assert_eq!(cities(&page), vec!["London", "Sydney"]);
    }

    #[test]
    fn test_sort_by_zip_code() {
        let (_dir, db) = seeded_db();

        let request = ListRequest::new(1, 2).unwrap().with_sort("zipCode.asc");
        let page = DeliveryAddress::list(&db, &request);
        assert_eq!(page.page_count, 3);
        assert_eq!(cities(&page), vec!["Tokyo", "Berlin"]);
    }

    #[test]
    fn test_serializes_like_the_table_expects() {
        let (_dir, db) = seeded_db();

        let request = ListRequest::default().with_filter("city", "Toronto");
        let page = DeliveryAddress::list(&db, &request);
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["pageCount"], 1);
        assert_eq!(json["total"], 1);
        assert_eq!(json["data"][0]["id"], "0987654321");
        assert_eq!(json["data"][0]["zipCode"], "M5V 2T6");
        assert_eq!(
            json["data"][0]["full_address"],
            "567 Maple Ave, Toronto, ON M5V 2T6, Canada"
        );
        assert_eq!(json["data"][0]["createdAt"], "2023-07-10T08:00:00Z");
        assert_eq!(json["data"][0]["updatedAt"], serde_json::Value::Null);
    }
}
