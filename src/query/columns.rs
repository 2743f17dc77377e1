use phf::ordered_map::Values;

use super::filter::FilterField;
use crate::collate::UNICODE_NOCASE;

pub type ColMap = phf::OrderedMap<&'static str, ColSpec>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColType {
    Id,
    Text,
    Enum,
    Date,
}

impl ColType {
    /// Text columns sort case-insensitively, Unicode letters included
    pub fn collation(&self) -> Option<&'static str> {
        match self {
            ColType::Text => Some(UNICODE_NOCASE),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ColSpec {
    pub name_db: &'static str,
    pub col_type: ColType,
}

impl ColSpec {
    pub const fn new(name_db: &'static str, col_type: ColType) -> Self {
        ColSpec { name_db, col_type }
    }
}

/// Everything the page query needs to know about one table: its columns keyed by
/// API name, the filters it accepts and its default ordering.
#[derive(Debug)]
pub struct TableSpec {
    pub table: &'static str,
    pub cols: &'static ColMap,
    pub filter_fields: &'static [FilterField],
    /// API name of the column used when no valid sort is requested (always descending)
    pub default_sort: &'static str,
    /// API name of the primary key, used as the ordering tie-breaker
    pub primary_key: &'static str,
}

impl TableSpec {
    pub fn col_spec(&self, column_name: &str) -> Option<&'static ColSpec> {
        self.cols.get(column_name)
    }

    pub fn col_name_to_db(&self, column_name: &str) -> Option<&'static str> {
        self.col_spec(column_name).map(|col_spec| col_spec.name_db)
    }

    pub fn values(&self) -> Values<'static, &'static str, ColSpec> {
        self.cols.values()
    }

    pub fn cols_as_select_list(&self) -> String {
        let mut select_list = String::new();
        let mut first = true;

        for col_spec in self.values() {
            match first {
                true => first = false,
                false => select_list.push_str(", "),
            }
            select_list.push_str(col_spec.name_db);
        }

        select_list
    }
}
