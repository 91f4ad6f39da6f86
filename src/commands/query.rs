use crate::special::{ResultSet, Rows};
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::fmt::Write;
use std::time::Duration;

/// Renders one result set: title, rows, then status.
///
/// Pending cursor rows are drained here.
pub fn format_result_set(set: ResultSet<'_>, expanded: bool) -> String {
    let mut output = String::new();
    push_line(&mut output, set.title.as_deref());

    if let Some(headers) = &set.headers {
        let rows = set.rows.map(Rows::into_vec).unwrap_or_default();
        if expanded {
            write_vertical(&mut output, headers, &rows);
        } else {
            let _ = writeln!(output, "{}", build_table(headers, &rows));
        }
    }

    push_line(&mut output, set.status.as_deref());
    output
}

fn push_line(output: &mut String, line: Option<&str>) {
    if let Some(line) = line.filter(|l| !l.is_empty()) {
        let _ = writeln!(output, "{line}");
    }
}

fn build_table(headers: &[String], rows: &[Vec<String>]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|header| Cell::new(header).add_attribute(Attribute::Bold)),
    );
    for row in rows {
        table.add_row(row.iter().map(Cell::new));
    }
    table
}

/// One `header | value` line per column, like psql's `\x`.
fn write_vertical(output: &mut String, headers: &[String], rows: &[Vec<String>]) {
    let width = headers.iter().map(|h| h.chars().count()).max().unwrap_or(0);

    for (number, row) in rows.iter().enumerate() {
        let label = format!("-[ RECORD {} ]", number + 1);
        let _ = writeln!(
            output,
            "{label}{}",
            "-".repeat(50_usize.saturating_sub(label.len()))
        );
        for (header, value) in headers.iter().zip(row) {
            let _ = writeln!(output, "{header:>width$} | {value}");
        }
    }
}

pub fn format_timing(elapsed: Duration) -> String {
    format!("Time: {:.3}s", elapsed.as_secs_f64())
}
