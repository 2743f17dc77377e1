use serde::Serialize;

/// One page of rows plus the pagination metadata the table footer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page_count: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, per_page: u32) -> Self {
        Page {
            data,
            page_count: Self::page_count(total, per_page),
            total,
        }
    }

    /// What callers see when a fetch fails: no rows, no pages.
    pub fn empty() -> Self {
        Page {
            data: Vec::new(),
            page_count: 0,
            total: 0,
        }
    }

    pub fn page_count(total: u64, per_page: u32) -> u64 {
        match per_page {
            0 => 0,
            per_page => total.div_ceil(u64::from(per_page)),
        }
    }
}
