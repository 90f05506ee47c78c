//! Bulk-load consumer: drains one table's queue into `COPY ... FROM STDIN`.
//!
//! Rows are encoded in PostgreSQL's COPY text format and pushed to the
//! server in chunks, so neither the decoded dataset nor the encoded stream
//! is ever held in memory. One consumer holds one pool session for its whole
//! lifetime; the stream commits when the queue closes.

use crate::config::COPY_CHUNK_BYTES;
use crate::project::{Row, Value};
use crate::tables::Table;
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::time::Instant;
use tokio::sync::mpsc::Receiver;
use tracing::info;

/// Copy every row from `rows` into `table`. Returns the server-reported row
/// count. On error the receiver is dropped, which closes the queue and makes
/// the producer's next send fail — that is what stops the pipeline instead
/// of deadlocking on a full queue.
pub async fn copy_table(pool: PgPool, table: Table, mut rows: Receiver<Row>) -> Result<u64> {
    let started = Instant::now();

    let mut conn = pool
        .acquire()
        .await
        .with_context(|| format!("failed to acquire a session for {table}"))?;

    let statement = copy_statement(table);
    let mut sink = conn
        .copy_in_raw(&statement)
        .await
        .with_context(|| format!("failed to open a COPY stream for {table}"))?;

    let mut chunk = String::with_capacity(COPY_CHUNK_BYTES);
    while let Some(row) = rows.recv().await {
        encode_row(row.into_values(), &mut chunk);
        if chunk.len() >= COPY_CHUNK_BYTES {
            sink.send(chunk.as_bytes())
                .await
                .with_context(|| format!("COPY to {table} failed"))?;
            chunk.clear();
        }
    }
    if !chunk.is_empty() {
        sink.send(chunk.as_bytes())
            .await
            .with_context(|| format!("COPY to {table} failed"))?;
    }

    let copied = sink
        .finish()
        .await
        .with_context(|| format!("failed to commit the COPY stream for {table}"))?;

    info!(
        table = %table,
        rows = copied,
        elapsed = ?started.elapsed(),
        "copy finished"
    );
    Ok(copied)
}

/// Column identifiers are quoted: `join` is a keyword.
fn copy_statement(table: Table) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("COPY {} ({}) FROM STDIN", table.name(), columns)
}

/// Append one row in COPY text format: tab-separated cells, newline
/// terminated, `\N` for null.
pub fn encode_row(values: Vec<Value>, out: &mut String) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push('\t');
        }
        encode_value(value, out);
    }
    out.push('\n');
}

fn encode_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str(r"\N"),
        Value::BigInt(v) => out.push_str(&v.to_string()),
        Value::Int(v) => out.push_str(&v.to_string()),
        Value::Bool(v) => out.push(if *v { 't' } else { 'f' }),
        Value::Text(s) => push_escaped(s, out),
        Value::TextArray(items) => push_escaped(&array_literal(items), out),
        Value::Json(v) => push_escaped(&v.to_string(), out),
    }
}

/// COPY text-format escaping for a single cell.
fn push_escaped(cell: &str, out: &mut String) {
    for c in cell.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\t' => out.push_str(r"\t"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            c => out.push(c),
        }
    }
}

/// A `text[]` literal with every element quoted, so commas, braces and
/// whitespace in the data survive.
fn array_literal(items: &[String]) -> String {
    let mut literal = String::with_capacity(2 + items.iter().map(|i| i.len() + 3).sum::<usize>());
    literal.push('{');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            literal.push(',');
        }
        literal.push('"');
        for c in item.chars() {
            match c {
                '"' => literal.push_str("\\\""),
                '\\' => literal.push_str("\\\\"),
                c => literal.push(c),
            }
        }
        literal.push('"');
    }
    literal.push('}');
    literal
}
