//! MySQL backend for the special-command cursor.

mod connection;

pub use connection::MySqlCursor;
