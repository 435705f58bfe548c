//! Syntactic statement classification.
//!
//! Both judgments are deliberately cheap string checks, not parses.
//! `is_write_shaped` over-approximates writes (extra invalidation is
//! safe) and under-approximates reads (a skipped probe is safe).

/// Functions whose output depends on when the query runs.
///
/// A statement mentioning any of these must never be served from cache
/// nor written into it. Substring matching over-approximates (a column
/// named `package` trips the `AGE` check); the false positives only
/// cost cacheability.
const NON_DETERMINISTIC_FUNCTIONS: [&str; 11] = [
    "AGE",
    "CLOCK_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NOW",
    "STATEMENT_TIMESTAMP",
    "TIMEOFDAY",
    "TRANSACTION_TIMESTAMP",
];

/// True when the statement's result may be cached and served from cache.
pub fn is_cacheable(text: &str) -> bool {
    let upper = text.to_uppercase();
    !NON_DETERMINISTIC_FUNCTIONS
        .iter()
        .any(|name| upper.contains(name))
}

/// True when the statement may mutate data.
///
/// Read-shaped iff it starts with `SELECT`, or starts with `WITH` and
/// contains `SELECT`; everything else is treated as a write.
pub fn is_write_shaped(sql: &str) -> bool {
    let upper = sql.trim_start().to_uppercase();
    if upper.starts_with("SELECT") {
        return false;
    }
    if upper.starts_with("WITH") && upper.contains("SELECT") {
        return false;
    }
    true
}
