//! Unicode-aware text comparison registered on every pooled connection.
//!
//! SQLite's `NOCASE` and `LIKE` only fold ASCII letters, so "über" never matches
//! "Über". Text columns sort and compare through an ICU collator instead, and
//! pattern matches run against `unicode_lower(col)`.
use std::cmp::Ordering;

use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::Collator;
use rusqlite::{functions::FunctionFlags, Connection};

/// Collation for text columns: ignores case, keeps accents distinct.
pub const UNICODE_NOCASE: &str = "unicode_nocase";

/// SQL function lowercasing its argument with full Unicode case mapping. NULL stays NULL.
pub const UNICODE_LOWER: &str = "unicode_lower";

/// Secondary strength: case-insensitive but accent-sensitive ("Über" == "über", "ecole" != "école").
fn new_comparator() -> rusqlite::Result<impl Fn(&str, &str) -> Ordering + Send + 'static> {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Secondary);

    let collator = Collator::try_new(Default::default(), options)
        .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;

    Ok(move |a: &str, b: &str| collator.compare(a, b))
}

/// Lowercases a value the same way `unicode_lower` does in SQL.
pub fn lower(value: &str) -> String {
    value.to_lowercase()
}

pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_collation(UNICODE_NOCASE, new_comparator()?)?;

    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| lower(&v)))
        },
    )
}
