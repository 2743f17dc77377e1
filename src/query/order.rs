use log::debug;
use strum::Display;

use super::columns::TableSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than `asc` sorts descending.
    fn from_param(direction: Option<&str>) -> Self {
        match direction {
            Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderSpec {
    column: &'static str,
    direction: SortDirection,
    collation: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    order_specs: Vec<OrderSpec>,
}

impl Order {
    /// Resolves a `"<field>.<direction>"` sort parameter against the table's columns.
    /// Missing or unrecognized fields fall back to the table's default ordering.
    pub fn from_sort_param(sort: Option<&str>, table: &TableSpec) -> Self {
        let mut parts = sort
            .unwrap_or_default()
            .split('.')
            .filter(|part| !part.is_empty());

        let column = parts.next();
        let direction = parts.next();

        let (col_name, direction) = match column {
            Some(col_name) if table.col_spec(col_name).is_some() => {
                (col_name, SortDirection::from_param(direction))
            }
            Some(col_name) => {
                debug!(
                    "Unrecognized sort column '{}' for '{}' - using default order",
                    col_name, table.table
                );
                (table.default_sort, SortDirection::Desc)
            }
            None => (table.default_sort, SortDirection::Desc),
        };

        let mut order = Order {
            order_specs: Vec::new(),
        };
        order.push_spec(table, col_name, direction);

        // Primary key keeps rows with equal sort values in a stable order across pages
        if col_name != table.primary_key {
            order.push_spec(table, table.primary_key, SortDirection::Desc);
        }

        order
    }

    fn push_spec(&mut self, table: &TableSpec, col_name: &str, direction: SortDirection) {
        if let Some(col_spec) = table.col_spec(col_name) {
            self.order_specs.push(OrderSpec {
                column: col_spec.name_db,
                direction,
                collation: col_spec.col_type.collation(),
            });
        }
    }

    pub fn to_order_clause(&self) -> String {
        if self.order_specs.is_empty() {
            return String::new();
        }

        let mut order_clause = "\nORDER BY ".to_string();
        let mut first = true;

        for order in &self.order_specs {
            match first {
                true => first = false,
                false => order_clause.push_str(", "),
            }

            order_clause.push_str(order.column);

            if let Some(collation) = order.collation {
                order_clause.push_str(" COLLATE ");
                order_clause.push_str(collation);
            }

            order_clause.push(' ');
            order_clause.push_str(&order.direction.to_string());
        }
        order_clause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addresses::ADDRESSES_TABLE;
    use crate::tasks::TASKS_TABLE;
    use pretty_assertions::assert_eq;

    const DEFAULT_CLAUSE: &str = "\nORDER BY created_at DESC, id DESC";

    #[test]
    fn test_absent_sort_uses_default() {
        let order = Order::from_sort_param(None, &ADDRESSES_TABLE);
        assert_eq!(order.to_order_clause(), DEFAULT_CLAUSE);
    }

    #[test]
    fn test_unknown_column_uses_default() {
        let order = Order::from_sort_param(Some("nonexistent.asc"), &ADDRESSES_TABLE);
        assert_eq!(order.to_order_clause(), DEFAULT_CLAUSE);
    }

    #[test]
    fn test_db_column_name_is_not_a_sort_key() {
        let order = Order::from_sort_param(Some("zip_code.asc"), &ADDRESSES_TABLE);
        assert_eq!(order.to_order_clause(), DEFAULT_CLAUSE);
    }

    #[test]
    fn test_recognized_column_and_direction() {
        let order = Order::from_sort_param(Some("zipCode.asc"), &ADDRESSES_TABLE);
        assert_eq!(
            order.to_order_clause(),
            "\nORDER BY zip_code COLLATE unicode_nocase ASC, id DESC"
        );
    }

    #[test]
    fn test_direction_defaults_to_desc() {
        for sort in ["city", "city.", "city.up", "city.DESC"] {
            let order = Order::from_sort_param(Some(sort), &ADDRESSES_TABLE);
            assert_eq!(
                order.to_order_clause(),
                "\nORDER BY city COLLATE unicode_nocase DESC, id DESC",
                "sort '{sort}'"
            );
        }
    }

    #[test]
    fn test_direction_is_case_insensitive() {
        let order = Order::from_sort_param(Some("priority.ASC"), &TASKS_TABLE);
        assert_eq!(
            order.to_order_clause(),
            "\nORDER BY priority ASC, id DESC"
        );
    }

    #[test]
    fn test_primary_key_sort_has_no_tiebreak() {
        let order = Order::from_sort_param(Some("id.asc"), &TASKS_TABLE);
        assert_eq!(order.to_order_clause(), "\nORDER BY id ASC");
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let order = Order::from_sort_param(Some(".title.asc"), &TASKS_TABLE);
        assert_eq!(
            order.to_order_clause(),
            "\nORDER BY title COLLATE unicode_nocase ASC, id DESC"
        );
    }
}
