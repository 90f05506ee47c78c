//! The single-pass import pipeline.
//!
//! One producer decodes the dump and fans projected rows out to one bounded
//! queue per target table; one consumer per table streams its queue into the
//! database's COPY endpoint. The producer blocks when a queue is full, so a
//! slow table throttles decoding instead of growing a buffer.
//!
//! Startup order: truncate the dump type's tables, build the queues, spawn
//! the consumers, then the producer. Shutdown: the producer drops all
//! send-ends (end-of-input or failure), each consumer drains what is left
//! and commits, and the coordinator joins everything and combines the
//! outcomes. A consumer that fails drops its receive-end instead; the
//! producer's next send to that queue errors and brings the run down
//! without deadlocking.

use crate::config::{PROGRESS_INTERVAL, QUEUE_CAPACITY};
use crate::copy;
use crate::decoder::EntityReader;
use crate::dump::DumpFilename;
use crate::project::{project, Row};
use crate::tables::Table;
use anyhow::{anyhow, Context, Result};
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc::{self, Sender};
use tracing::{error, info};

/// Send-ends of the per-table queues, keyed by target table. The producer
/// owns the map; dropping it closes every queue.
pub type QueueMap = HashMap<Table, Sender<Row>>;

/// Rows copied into one table by a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCount {
    pub table: Table,
    pub rows: u64,
}

/// Truncate-and-reload `path` into the tables its dump type feeds.
/// Returns per-table row counts, or the first error any task hit.
pub async fn run_import(pool: &PgPool, path: &Path) -> Result<Vec<TableCount>> {
    let started = Instant::now();

    let filename = DumpFilename::new(path);
    let dump_type = filename.dump_type()?;
    let tables = Table::for_dump(dump_type);
    info!(dump = %filename, kind = %dump_type, tables = tables.len(), "starting import");

    // Each run is a full reload; cascade so dependent tables cannot hold
    // stale references.
    for &table in tables {
        sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table.name()))
            .execute(pool)
            .await
            .with_context(|| format!("failed to truncate {table}"))?;
        info!(table = %table, "truncated");
    }

    let mut queues: QueueMap = HashMap::with_capacity(tables.len());
    let mut consumers = Vec::with_capacity(tables.len());
    for &table in tables {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        queues.insert(table, tx);
        consumers.push((table, tokio::spawn(copy::copy_table(pool.clone(), table, rx))));
    }

    let input: PathBuf = path.to_path_buf();
    let producer = tokio::task::spawn_blocking(move || produce(&input, queues));

    let mut failure: Option<anyhow::Error> = None;

    match producer.await.context("producer task panicked")? {
        Ok(entities) => info!(entities, "producer finished"),
        Err(e) => {
            error!(error = %e, "producer failed");
            failure = Some(e);
        }
    }

    let mut counts = Vec::with_capacity(consumers.len());
    for (table, handle) in consumers {
        match handle.await.context("copy task panicked")? {
            Ok(rows) => counts.push(TableCount { table, rows }),
            Err(e) => {
                error!(table = %table, error = %e, "copy failed");
                if failure.is_none() {
                    failure = Some(e);
                }
            }
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }

    info!(elapsed = ?started.elapsed(), "import finished");
    Ok(counts)
}

/// Decode `path` and route every projected row to the queue of its table.
/// Blocks on full queues (backpressure). All send-ends are dropped on
/// return, which is what tells the consumers to finish.
pub fn produce(path: &Path, queues: QueueMap) -> Result<u64> {
    let reader = EntityReader::open(path)?;
    let mut entities = 0u64;

    for entity in reader {
        for row in project(entity?)? {
            let table = row.table();
            let queue = queues
                .get(&table)
                .ok_or_else(|| anyhow!("no queue for {table}: entity does not match the dump type"))?;
            queue
                .blocking_send(row)
                .map_err(|_| anyhow!("copy task for {table} stopped early"))?;
        }
        entities += 1;
        if entities % PROGRESS_INTERVAL == 0 {
            info!(entities, "decoding");
        }
    }

    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Value;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use tokio::sync::mpsc::Receiver;

    fn write_gz_dump(dir: &TempDir, name: &str, xml: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(xml.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();
        path
    }

    fn channels(tables: &[Table]) -> (QueueMap, Vec<(Table, Receiver<Row>)>) {
        let mut queues = HashMap::new();
        let mut receivers = Vec::new();
        for &table in tables {
            let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
            queues.insert(table, tx);
            receivers.push((table, rx));
        }
        (queues, receivers)
    }

    async fn drain(mut rx: Receiver<Row>) -> Vec<Row> {
        let mut rows = Vec::new();
        while let Some(row) = rx.recv().await {
            rows.push(row);
        }
        rows
    }

    #[tokio::test]
    async fn produce_fans_out_artist_rows() {
        let dir = TempDir::new().unwrap();
        let xml = r#"<artists>
            <artist><id>1</id><name>A</name><realname></realname><data_quality>NDQ</data_quality>
                <aliases><name id="2">B</name></aliases></artist>
            <artist><id>7</id><name>C</name>
                <members><name id="8">D</name><name id="9">E</name></members></artist>
        </artists>"#;
        let path = write_gz_dump(&dir, "discogs_202403_artists.xml.gz", xml);

        let tables = Table::for_dump(crate::dump::DumpType::Artists);
        let (queues, receivers) = channels(tables);

        let producer = tokio::task::spawn_blocking(move || produce(&path, queues));

        let mut by_table = HashMap::new();
        for (table, rx) in receivers {
            by_table.insert(table, drain(rx).await);
        }

        let entities = producer.await.unwrap().unwrap();
        assert_eq!(entities, 2);
        assert_eq!(by_table[&Table::Artists].len(), 2);
        assert_eq!(by_table[&Table::ArtistAliases].len(), 1);
        assert_eq!(by_table[&Table::ArtistMembers].len(), 2);

        // scenario: the alias row carries the parent artist id
        assert_eq!(
            by_table[&Table::ArtistAliases][0],
            Row::ArtistAlias { artist_id: 1, alias_id: 2 }
        );

        // normalized empty realname reaches the row as null
        let values = by_table[&Table::Artists][0].clone().into_values();
        assert_eq!(values[2], Value::Null);
    }

    #[tokio::test]
    async fn produce_preserves_per_queue_fifo() {
        let dir = TempDir::new().unwrap();
        let mut xml = String::from("<artists>");
        for id in 1..=50 {
            xml.push_str(&format!("<artist><id>{id}</id><name>N{id}</name></artist>"));
        }
        xml.push_str("</artists>");
        let path = write_gz_dump(&dir, "discogs_202403_artists.xml.gz", &xml);

        let tables = Table::for_dump(crate::dump::DumpType::Artists);
        let (queues, receivers) = channels(tables);
        let producer = tokio::task::spawn_blocking(move || produce(&path, queues));

        let mut by_table = HashMap::new();
        for (table, rx) in receivers {
            by_table.insert(table, drain(rx).await);
        }
        producer.await.unwrap().unwrap();

        let ids: Vec<i64> = by_table[&Table::Artists]
            .iter()
            .map(|row| match row {
                Row::Artist { id, .. } => *id,
                other => panic!("unexpected row {other:?}"),
            })
            .collect();
        assert_eq!(ids, (1..=50).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn produce_fails_when_a_consumer_goes_away() {
        let dir = TempDir::new().unwrap();
        let mut xml = String::from("<artists>");
        for id in 1..=10 {
            xml.push_str(&format!("<artist><id>{id}</id><name>N</name></artist>"));
        }
        xml.push_str("</artists>");
        let path = write_gz_dump(&dir, "discogs_202403_artists.xml.gz", &xml);

        let tables = Table::for_dump(crate::dump::DumpType::Artists);
        let (queues, mut receivers) = channels(tables);

        // the ARTISTS consumer dies immediately; the others keep draining
        let artists_index = receivers
            .iter()
            .position(|(table, _)| *table == Table::Artists)
            .unwrap();
        let (_, artists_rx) = receivers.remove(artists_index);
        drop(artists_rx);

        let producer = tokio::task::spawn_blocking(move || produce(&path, queues));
        for (_, rx) in receivers {
            drain(rx).await;
        }

        let err = producer.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("stopped early"), "got: {err}");
    }

    #[tokio::test]
    async fn produce_reports_decode_errors_and_closes_queues() {
        let dir = TempDir::new().unwrap();
        let xml = "<artists><artist><id>1</id><name>A</name></artist><artist><id>2</name></artists>";
        let path = write_gz_dump(&dir, "discogs_202403_artists.xml.gz", xml);

        let tables = Table::for_dump(crate::dump::DumpType::Artists);
        let (queues, receivers) = channels(tables);
        let producer = tokio::task::spawn_blocking(move || produce(&path, queues));

        // every queue closes even though the producer failed, so consumers
        // drain what they got and exit cleanly
        let mut by_table = HashMap::new();
        for (table, rx) in receivers {
            by_table.insert(table, drain(rx).await);
        }

        let err = producer.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("XML parse error"), "got: {err}");
        assert_eq!(by_table[&Table::Artists].len(), 1);
    }

    #[tokio::test]
    async fn produce_rejects_entities_outside_the_dump_type() {
        let dir = TempDir::new().unwrap();
        // a labels file that actually contains an artist record
        let xml = "<labels><artist><id>1</id><name>A</name></artist></labels>";
        let path = write_gz_dump(&dir, "discogs_202403_labels.xml.gz", xml);

        let tables = Table::for_dump(crate::dump::DumpType::Labels);
        let (queues, receivers) = channels(tables);
        let producer = tokio::task::spawn_blocking(move || produce(&path, queues));
        for (_, rx) in receivers {
            drain(rx).await;
        }

        let err = producer.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("no queue for"), "got: {err}");
    }
}
