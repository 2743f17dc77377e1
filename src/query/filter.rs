use std::fmt::Debug;
use std::str::FromStr;

use rusqlite::ToSql;
use strum::{Display, EnumString};

use crate::collate::{self, UNICODE_LOWER, UNICODE_NOCASE};
use crate::{error::AppError, utils::Utils};

use super::{columns::TableSpec, request::ListRequest};

/// Defines the behavior of a filter.
pub trait Filter: Debug {
    /// return predicate text and params
    fn to_predicate_parts(&self) -> Result<(String, Vec<Box<dyn ToSql>>), AppError>;
}

/// Comparison selected by a `~op` suffix on a filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FilterOp {
    #[strum(serialize = "ilike")]
    ILike,
    #[strum(serialize = "notIlike")]
    NotILike,
    #[strum(serialize = "startsWith")]
    StartsWith,
    #[strum(serialize = "endsWith")]
    EndsWith,
    #[strum(serialize = "eq")]
    Eq,
    #[strum(serialize = "notEq")]
    NotEq,
    #[strum(serialize = "isNull")]
    IsNull,
    #[strum(serialize = "isNotNull")]
    IsNotNull,
}

impl FilterOp {
    fn takes_value(&self) -> bool {
        !matches!(self, FilterOp::IsNull | FilterOp::IsNotNull)
    }
}

/// Splits `"value~op"` into its value and optional operator. A suffix that is not a
/// known operator belongs to the value, so `"a~b"` searches for `a~b`.
pub fn split_filter_value(raw: &str) -> Result<(&str, Option<FilterOp>), AppError> {
    let suffix_op = raw
        .rsplit_once('~')
        .and_then(|(value, op_str)| Some((value, FilterOp::from_str(op_str.trim()).ok()?)));

    let (value, op) = match suffix_op {
        Some((value, op)) => (value.trim(), Some(op)),
        None => (raw.trim(), None),
    };

    let needs_value = match op {
        Some(op) => op.takes_value(),
        None => true,
    };
    if needs_value && value.is_empty() {
        return Err(AppError::Error(format!("Filter value '{raw}' is empty")));
    }

    Ok((value, op))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive text comparison against a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter {
    str_col_db: &'static str,
    op: FilterOp,
    str_value: String,
}

impl Filter for TextFilter {
    fn to_predicate_parts(&self) -> Result<(String, Vec<Box<dyn ToSql>>), AppError> {
        let col = self.str_col_db;
        let mut pred_vec: Vec<Box<dyn ToSql>> = Vec::new();

        let like_pattern = |prefix: &str, suffix: &str| {
            format!("{prefix}{}{suffix}", escape_like(&collate::lower(&self.str_value)))
        };
        let lowered = format!("{UNICODE_LOWER}({col})");

        let pred_str = match self.op {
            FilterOp::ILike => {
                pred_vec.push(Box::new(like_pattern("%", "%")));
                format!("({lowered} LIKE ? ESCAPE '\\')")
            }
            FilterOp::NotILike => {
                pred_vec.push(Box::new(like_pattern("%", "%")));
                format!("({lowered} NOT LIKE ? ESCAPE '\\')")
            }
            FilterOp::StartsWith => {
                pred_vec.push(Box::new(like_pattern("", "%")));
                format!("({lowered} LIKE ? ESCAPE '\\')")
            }
            FilterOp::EndsWith => {
                pred_vec.push(Box::new(like_pattern("%", "")));
                format!("({lowered} LIKE ? ESCAPE '\\')")
            }
            FilterOp::Eq => {
                pred_vec.push(Box::new(self.str_value.clone()));
                format!("({col} = ? COLLATE {UNICODE_NOCASE})")
            }
            FilterOp::NotEq => {
                pred_vec.push(Box::new(self.str_value.clone()));
                format!("({col} <> ? COLLATE {UNICODE_NOCASE})")
            }
            FilterOp::IsNull => format!("({col} IS NULL)"),
            FilterOp::IsNotNull => format!("({col} IS NOT NULL)"),
        };

        Ok((pred_str, pred_vec))
    }
}

impl TextFilter {
    pub fn new(str_col_db: &'static str, raw: &str) -> Result<Self, AppError> {
        let (value, op) = split_filter_value(raw)?;

        Ok(TextFilter {
            str_col_db,
            op: op.unwrap_or(FilterOp::ILike),
            str_value: value.to_owned(),
        })
    }
}

/// Exact match against one or more accepted values, given comma separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectFilter {
    str_col_db: &'static str,
    negated: bool,
    null_check: Option<bool>,
    str_values: Vec<String>,
}

impl Filter for SelectFilter {
    fn to_predicate_parts(&self) -> Result<(String, Vec<Box<dyn ToSql>>), AppError> {
        let col = self.str_col_db;

        if let Some(is_null) = self.null_check {
            let pred_str = match is_null {
                true => format!("({col} IS NULL)"),
                false => format!("({col} IS NOT NULL)"),
            };
            return Ok((pred_str, Vec::new()));
        }

        let mut pred_str = format!("({col} ");
        if self.negated {
            pred_str.push_str("NOT ");
        }
        pred_str.push_str("IN (");

        let mut pred_vec: Vec<Box<dyn ToSql>> = Vec::new();
        let mut first = true;

        for str_val in &self.str_values {
            match first {
                true => first = false,
                false => pred_str.push_str(", "),
            }
            pred_str.push('?');
            pred_vec.push(Box::new(str_val.to_owned()));
        }

        pred_str.push_str("))");

        Ok((pred_str, pred_vec))
    }
}

impl SelectFilter {
    pub fn new(str_col_db: &'static str, raw: &str) -> Result<Self, AppError> {
        let (value, op) = split_filter_value(raw)?;

        let null_check = match op {
            Some(FilterOp::IsNull) => Some(true),
            Some(FilterOp::IsNotNull) => Some(false),
            _ => None,
        };

        let str_values: Vec<String> = match null_check {
            Some(_) => Vec::new(),
            None => value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .collect(),
        };

        if null_check.is_none() && str_values.is_empty() {
            return Err(AppError::Error(format!(
                "Filter value '{raw}' has no selectable values"
            )));
        }

        Ok(SelectFilter {
            str_col_db,
            negated: op == Some(FilterOp::NotEq),
            null_check,
            str_values,
        })
    }
}

/// Inclusive range over a timestamp column, whole days at both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRangeFilter {
    date_col_db: &'static str,
    date_start: i64,
    date_end: i64,
}

impl Filter for DateRangeFilter {
    fn to_predicate_parts(&self) -> Result<(String, Vec<Box<dyn ToSql>>), AppError> {
        let pred_str = format!("({} BETWEEN ? AND ?)", self.date_col_db);
        let pred_vec: Vec<Box<dyn ToSql>> =
            vec![Box::new(self.date_start), Box::new(self.date_end)];

        Ok((pred_str, pred_vec))
    }
}

impl DateRangeFilter {
    pub fn new(date_col_db: &'static str, from: &str, to: &str) -> Result<Self, AppError> {
        let (date_start, date_end) = Utils::range_date_bounds(from, to)?;

        Ok(DateRangeFilter {
            date_col_db,
            date_start,
            date_end,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-insensitive partial match by default
    Text,
    /// One or more exact values
    Select,
    /// Bounded by a pair of `yyyy-mm-dd` parameters; both must be present
    DateRange { to_param: &'static str },
}

/// Binds a request parameter to a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    /// Request parameter holding the value (the `from` side for date ranges)
    pub param: &'static str,
    /// API name of the filtered column
    pub column: &'static str,
    pub kind: FilterKind,
}

impl FilterField {
    pub const fn text(param: &'static str, column: &'static str) -> Self {
        FilterField {
            param,
            column,
            kind: FilterKind::Text,
        }
    }

    pub const fn select(param: &'static str, column: &'static str) -> Self {
        FilterField {
            param,
            column,
            kind: FilterKind::Select,
        }
    }

    pub const fn date_range(
        from_param: &'static str,
        to_param: &'static str,
        column: &'static str,
    ) -> Self {
        FilterField {
            param: from_param,
            column,
            kind: FilterKind::DateRange { to_param },
        }
    }

    /// Builds this field's filter from the request. `Ok(None)` means the field
    /// is not present in the request and contributes no predicate.
    pub fn build_filter(
        &self,
        request: &ListRequest,
        table: &TableSpec,
    ) -> Result<Option<Box<dyn Filter>>, AppError> {
        let col_db = table.col_name_to_db(self.column).ok_or_else(|| {
            AppError::Error(format!(
                "Column not found: '{}' in table '{}'",
                self.column, table.table
            ))
        })?;

        let Some(value) = request.filter_value(self.param) else {
            return Ok(None);
        };

        let filter: Box<dyn Filter> = match self.kind {
            FilterKind::Text => Box::new(TextFilter::new(col_db, value)?),
            FilterKind::Select => Box::new(SelectFilter::new(col_db, value)?),
            FilterKind::DateRange { to_param } => match request.filter_value(to_param) {
                Some(to) => Box::new(DateRangeFilter::new(col_db, value, to)?),
                None => return Ok(None),
            },
        };

        Ok(Some(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TASKS_TABLE;
    use pretty_assertions::assert_eq;
    use rusqlite::types::{ToSqlOutput, ValueRef};

    fn parts(filter: &dyn Filter) -> (String, usize) {
        let (pred_str, pred_vec) = filter.to_predicate_parts().unwrap();
        (pred_str, pred_vec.len())
    }

    #[test]
    fn test_split_filter_value() {
        assert_eq!(split_filter_value("Canada").unwrap(), ("Canada", None));
        assert_eq!(
            split_filter_value("Can~startsWith").unwrap(),
            ("Can", Some(FilterOp::StartsWith))
        );
        assert_eq!(
            split_filter_value("~isNull").unwrap(),
            ("", Some(FilterOp::IsNull))
        );
        assert_eq!(
            split_filter_value("x~NOTEQ").unwrap(),
            ("x", Some(FilterOp::NotEq))
        );
    }

    #[test]
    fn test_split_filter_value_errors() {
        assert!(split_filter_value("   ").is_err());
        assert!(split_filter_value("~eq").is_err());
        assert!(split_filter_value("~startsWith").is_err());
    }

    #[test]
    fn test_split_filter_value_keeps_tilde_in_value() {
        assert_eq!(split_filter_value("a~b").unwrap(), ("a~b", None));
        assert_eq!(split_filter_value("x~between").unwrap(), ("x~between", None));
        assert_eq!(
            split_filter_value("a~b~eq").unwrap(),
            ("a~b", Some(FilterOp::Eq))
        );
        assert_eq!(split_filter_value("~").unwrap(), ("~", None));
    }

    #[test]
    fn test_text_filter_lowercases_pattern() {
        let filter = TextFilter::new("title", "ÜBER_50%~startsWith").unwrap();
        let (_, pred_vec) = filter.to_predicate_parts().unwrap();
        assert_eq!(pred_vec.len(), 1);
        assert_eq!(
            pred_vec[0].to_sql().unwrap(),
            ToSqlOutput::Borrowed(ValueRef::Text("über\\_50\\%%".as_bytes()))
        );
    }

    #[test]
    fn test_text_filter_defaults_to_contains() {
        let filter = TextFilter::new("title", "report").unwrap();
        let (pred_vec_str, count) = parts(&filter);
        assert_eq!(pred_vec_str, "(unicode_lower(title) LIKE ? ESCAPE '\\')");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_text_filter_operators() {
        let cases = [
            ("a~notIlike", "(unicode_lower(title) NOT LIKE ? ESCAPE '\\')", 1),
            ("a~startsWith", "(unicode_lower(title) LIKE ? ESCAPE '\\')", 1),
            ("a~endsWith", "(unicode_lower(title) LIKE ? ESCAPE '\\')", 1),
            ("a~eq", "(title = ? COLLATE unicode_nocase)", 1),
            ("a~notEq", "(title <> ? COLLATE unicode_nocase)", 1),
            ("~isNull", "(title IS NULL)", 0),
            ("~isNotNull", "(title IS NOT NULL)", 0),
        ];

        for (raw, expected, params) in cases {
            let filter = TextFilter::new("title", raw).unwrap();
            assert_eq!(parts(&filter), (expected.to_owned(), params), "value '{raw}'");
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_select_filter_multiple_values() {
        let filter = SelectFilter::new("status", "todo, done,,").unwrap();
        assert_eq!(parts(&filter), ("(status IN (?, ?))".to_owned(), 2));
    }

    #[test]
    fn test_select_filter_not_eq() {
        let filter = SelectFilter::new("status", "canceled~notEq").unwrap();
        assert_eq!(parts(&filter), ("(status NOT IN (?))".to_owned(), 1));
    }

    #[test]
    fn test_select_filter_text_ops_mean_eq() {
        let filter = SelectFilter::new("status", "done~ilike").unwrap();
        assert_eq!(parts(&filter), ("(status IN (?))".to_owned(), 1));
    }

    #[test]
    fn test_select_filter_null_checks() {
        let filter = SelectFilter::new("status", "~isNotNull").unwrap();
        assert_eq!(parts(&filter), ("(status IS NOT NULL)".to_owned(), 0));
    }

    #[test]
    fn test_select_filter_rejects_only_separators() {
        assert!(SelectFilter::new("status", " , ,").is_err());
    }

    #[test]
    fn test_date_range_filter() {
        let filter = DateRangeFilter::new("created_at", "2023-01-01", "2023-12-31").unwrap();
        assert_eq!(filter.date_start, 1_672_531_200);
        assert_eq!(filter.date_end, 1_704_067_199);
        assert_eq!(
            parts(&filter),
            ("(created_at BETWEEN ? AND ?)".to_owned(), 2)
        );
    }

    #[test]
    fn test_build_filter_absent_field() {
        let request = ListRequest::default();
        let field = FilterField::text("title", "title");
        assert!(field.build_filter(&request, &TASKS_TABLE).unwrap().is_none());
    }

    #[test]
    fn test_build_filter_date_range_needs_both_bounds() {
        let field = FilterField::date_range("from", "to", "createdAt");

        let only_from = ListRequest::default().with_filter("from", "2023-01-01");
        assert!(field.build_filter(&only_from, &TASKS_TABLE).unwrap().is_none());

        let only_to = ListRequest::default().with_filter("to", "2023-12-31");
        assert!(field.build_filter(&only_to, &TASKS_TABLE).unwrap().is_none());

        let both = ListRequest::default()
            .with_filter("from", "2023-01-01")
            .with_filter("to", "2023-12-31");
        assert!(field.build_filter(&both, &TASKS_TABLE).unwrap().is_some());
    }

    #[test]
    fn test_build_filter_bad_date_is_error() {
        let field = FilterField::date_range("from", "to", "createdAt");
        let request = ListRequest::default()
            .with_filter("from", "2023-01-01")
            .with_filter("to", "not-a-date");
        assert!(field.build_filter(&request, &TASKS_TABLE).is_err());
    }

    #[test]
    fn test_build_filter_unknown_column_is_error() {
        let field = FilterField::text("title", "nope");
        let request = ListRequest::default().with_filter("title", "x");
        assert!(field.build_filter(&request, &TASKS_TABLE).is_err());
    }
}
