//! Cache key composition.
//!
//! Three key shapes share the keyspace, told apart by their colon
//! count and prefixes:
//!
//! - `<client-remote>` — session key, value is the database name
//! - `<server-remote>:<db>:<request>` — response key
//! - `<table>:<server-remote>:<db>:<request>` — table index key

/// Composes the response key for a `(server, database, request)` triple.
pub fn response_key(server_remote: &str, database: &str, request: &str) -> String {
    [server_remote, database, request].join(":")
}

/// Composes the index key tying `table` to a response key.
pub fn table_key(table: &str, response_key: &str) -> String {
    format!("{table}:{response_key}")
}

/// SCAN pattern matching every index key of `table`.
pub fn table_pattern(table: &str) -> String {
    format!("{table}:*")
}

/// Recovers the response key from an index key of `table`.
pub fn strip_table_prefix<'a>(index_key: &'a str, table: &str) -> Option<&'a str> {
    index_key.strip_prefix(table).and_then(|rest| rest.strip_prefix(':'))
}
