use anyhow::{Context, Result};
use clap::ValueEnum;
use cypherlite_query::{Row, Value};
use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per row.
    Ndjson,
    /// Aligned columns, written once all rows are in.
    Table,
}

/// Writes rows as they arrive (NDJSON) or after the last one (table).
/// Stops at the first failed row. Returns the number of rows written.
pub fn write_rows<W, I>(out: &mut W, format: OutputFormat, columns: &[String], rows: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = cypherlite_query::Result<Row>>,
{
    match format {
        OutputFormat::Ndjson => {
            let mut count = 0;
            for row in rows {
                let row = row.context("query execution failed")?;
                serde_json::to_writer(&mut *out, &row.to_json())?;
                out.write_all(b"\n")?;
                count += 1;
            }
            Ok(count)
        }
        OutputFormat::Table => {
            let rows = rows
                .into_iter()
                .collect::<cypherlite_query::Result<Vec<_>>>()
                .context("query execution failed")?;
            write_table(out, columns, &rows)?;
            Ok(rows.len())
        }
    }
}

fn write_table<W: Write>(out: &mut W, columns: &[String], rows: &[Row]) -> Result<()> {
    if columns.is_empty() {
        return Ok(());
    }
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.values().into_iter().map(cell).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for line in &cells {
        for (width, text) in widths.iter_mut().zip(line) {
            *width = (*width).max(text.chars().count());
        }
    }

    write_line(out, columns, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("-+-"))?;
    for line in &cells {
        write_line(out, line, &widths)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> Result<()> {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(text, width)| format!("{text:<width$}"))
        .collect();
    writeln!(out, "{}", padded.join(" | ").trim_end())?;
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::NodeId(id) => id.clone(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cypherlite_query::Error;

    fn row(pairs: &[(&str, Value)]) -> Row {
        Row::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn ndjson_writes_one_object_per_line() {
        let rows = vec![
            Ok(row(&[("n", Value::NodeId("a".into()))])),
            Ok(row(&[("n", Value::NodeId("b".into()))])),
        ];
        let mut out = Vec::new();
        let count = write_rows(&mut out, OutputFormat::Ndjson, &["n".into()], rows).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"n\":{\"type\":\"node_id\",\"id\":\"a\"}}\n{\"n\":{\"type\":\"node_id\",\"id\":\"b\"}}\n"
        );
    }

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            Ok(row(&[
                ("n", Value::NodeId("a".into())),
                ("n.name", Value::String("Ann".into())),
            ])),
            Ok(row(&[
                ("n", Value::NodeId("long-id".into())),
                ("n.name", Value::Int(7)),
            ])),
        ];
        let mut out = Vec::new();
        let columns = vec!["n".to_string(), "n.name".to_string()];
        write_rows(&mut out, OutputFormat::Table, &columns, rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "n       | n.name\n--------+-------\na       | Ann\nlong-id | 7\n"
        );
    }

    #[test]
    fn failed_row_stops_output() {
        let rows = vec![
            Ok(row(&[("n", Value::NodeId("a".into()))])),
            Err(Error::UnresolvedDesignation("m".into())),
            Ok(row(&[("n", Value::NodeId("c".into()))])),
        ];
        let mut out = Vec::new();
        let err = write_rows(&mut out, OutputFormat::Ndjson, &["n".into()], rows).unwrap_err();
        assert!(format!("{err:#}").contains("unresolved designation `m`"));
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
