use crate::error::DatabaseError;
use crate::special::{Cursor, Row};
use mysql::prelude::*;
use mysql::{Conn, OptsBuilder, Value};
use std::collections::VecDeque;
use tracing::debug;

/// A MySQL connection exposed through the [`Cursor`] interface.
///
/// Each `execute` buffers the rows of the statement's first result set.
pub struct MySqlCursor {
    conn: Conn,
    connection_id: u32,
    server_version: String,
    columns: Option<Vec<String>>,
    rows: VecDeque<Row>,
    status: String,
}

impl MySqlCursor {
    pub fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: Option<&str>,
    ) -> Result<Self, DatabaseError> {
        let mut opts_builder = OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .tcp_port(port)
            .user(Some(user))
            .pass(Some(password));

        if let Some(db) = database {
            opts_builder = opts_builder.db_name(Some(db));
        }

        let mut conn = Conn::new(opts_builder)?;

        let connection_id: u32 = conn.query_first("SELECT CONNECTION_ID()")?.unwrap_or(0);
        let server_version: String = conn.query_first("SELECT VERSION()")?.unwrap_or_default();
        debug!("Connected to {}:{} as {} (id {}).", host, port, user, connection_id);

        Ok(Self {
            conn,
            connection_id,
            server_version,
            columns: None,
            rows: VecDeque::new(),
            status: String::new(),
        })
    }

    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }
}

impl Cursor for MySqlCursor {
    fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.columns = None;
        self.rows.clear();
        self.status.clear();

        let result = self.conn.query_iter(sql)?;
        let columns: Vec<String> = result
            .columns()
            .as_ref()
            .iter()
            .map(|col| col.name_str().to_string())
            .collect();
        let affected = result.affected_rows();

        let mut rows = VecDeque::new();
        for row in result {
            let row = row?;
            rows.push_back((0..row.len()).map(|i| cell(&row, i)).collect());
        }

        if columns.is_empty() {
            self.status = format!("OK, {affected} rows affected");
        } else {
            self.status = format!("SELECT {}", rows.len());
            self.columns = Some(columns);
        }
        self.rows = rows;
        debug!("{:?}: {}", sql, self.status);
        Ok(())
    }

    fn description(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn status_message(&self) -> &str {
        &self.status
    }

    fn fetch_row(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }
}

fn cell(row: &mysql::Row, index: usize) -> String {
    match row.get_opt::<Value, usize>(index) {
        Some(Ok(value)) => format_value(&value),
        Some(Err(_)) => "ERROR".to_string(),
        None => "NULL".to_string(),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::NULL => "NULL".to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, hour, minute, second, micro) => {
            if *hour == 0 && *minute == 0 && *second == 0 && *micro == 0 {
                format!("{:04}-{:02}-{:02}", year, month, day)
            } else {
                format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                )
            }
        }
        Value::Time(neg, days, hours, minutes, seconds, _micro) => {
            let sign = if *neg { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
        }
    }
}
