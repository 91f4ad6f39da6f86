/*!
 * SQL completion module
 *
 * Provides context-aware completion for the interactive shell:
 * - classification of the cursor position (keywords, tables, columns, databases)
 * - extraction of the tables referenced by the input
 * - cached database, table and column names
 */

pub mod classifier;
pub mod helper;
pub mod metadata;
pub mod parseutils;

pub use classifier::{classify, Category, Classification};
pub use helper::SqlHelper;
pub use metadata::DatabaseMetadata;
pub use parseutils::{extract_tables, TableRef};
