//! SQL inspection: statement classification and table enumeration.
//!
//! The proxy never executes SQL; it only needs two cheap judgments per
//! statement (is it write-shaped? may its result be cached?) and, for
//! indexing and invalidation, the list of tables a statement touches.

mod classifier;
mod tables;

pub use classifier::{is_cacheable, is_write_shaped};
pub use tables::tables_in;

use thiserror::Error;

/// SQL analysis errors.
#[derive(Debug, Error)]
pub enum SqlError {
    /// The statement did not parse
    #[error("failed to parse SQL: {0}")]
    Parse(#[from] sqlparser::parser::ParserError),
}
