use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AppError;

/// How multiple active filter predicates combine.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    And,
    Or,
}

impl Operator {
    pub fn joiner(&self) -> &'static str {
        match self {
            Operator::And => " AND ",
            Operator::Or => " OR ",
        }
    }
}

/// A validated list request: pagination, sort and the raw filter values.
///
/// The filter map holds every other non-empty parameter; each table only looks
/// at the parameters its filter fields declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub page: u32,
    pub per_page: u32,
    pub sort: Option<String>,
    pub operator: Operator,
    filters: BTreeMap<String, String>,
}

impl Default for ListRequest {
    fn default() -> Self {
        ListRequest {
            page: Self::DEFAULT_PAGE,
            per_page: Self::DEFAULT_PER_PAGE,
            sort: None,
            operator: Operator::And,
            filters: BTreeMap::new(),
        }
    }
}

impl ListRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_PER_PAGE: u32 = 10;

    const PAGE: &str = "page";
    const PER_PAGE: &str = "per_page";
    const SORT: &str = "sort";
    const OPERATOR: &str = "operator";

    pub fn new(page: u32, per_page: u32) -> Result<Self, AppError> {
        Ok(ListRequest {
            page: Self::check_positive(Self::PAGE, page)?,
            per_page: Self::check_positive(Self::PER_PAGE, per_page)?,
            ..Default::default()
        })
    }

    pub fn with_sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_owned());
        self
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_filter(mut self, param: &str, value: &str) -> Self {
        self.filters.insert(param.to_owned(), value.to_owned());
        self
    }

    /// Coerces raw query-string parameters into a request. Empty values count as absent.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = ListRequest::default();

        for (key, value) in params {
            let key = key.as_ref();
            let value = value.as_ref().trim();

            if value.is_empty() {
                continue;
            }

            match key {
                Self::PAGE => request.page = Self::parse_positive(key, value)?,
                Self::PER_PAGE => request.per_page = Self::parse_positive(key, value)?,
                Self::SORT => request.sort = Some(value.to_owned()),
                Self::OPERATOR => {
                    request.operator = Operator::from_str(value).map_err(|_| {
                        AppError::invalid_param(key, format!("expected 'and' or 'or', got '{value}'"))
                    })?
                }
                _ => {
                    request.filters.insert(key.to_owned(), value.to_owned());
                }
            }
        }

        Ok(request)
    }

    fn parse_positive(param: &str, value: &str) -> Result<u32, AppError> {
        let parsed: u32 = value.parse().map_err(|_| {
            AppError::invalid_param(param, format!("expected a positive integer, got '{value}'"))
        })?;
        Self::check_positive(param, parsed)
    }

    fn check_positive(param: &str, value: u32) -> Result<u32, AppError> {
        match value {
            0 => Err(AppError::invalid_param(param, "must be at least 1")),
            v => Ok(v),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn filter_value(&self, param: &str) -> Option<&str> {
        self.filters
            .get(param)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}
