//! Single-pass streaming importer for Discogs monthly dumps into PostgreSQL.
//!
//! A dump file (artists, labels, masters or releases; XML, optionally
//! gzipped) feeds between one and four tables. One pass over the file does
//! all of them at once:
//!
//! 1. **Decode** -- pull-parse the XML and deserialize each top-level entity
//!    into a typed record, normalizing empty text and sentinel zeros to
//!    absent
//! 2. **Project** -- expand every entity into flat row tuples, one bundle
//!    per entity across its target tables (a release yields a parent row
//!    plus artist, extra-artist and label rows)
//! 3. **Fan out** -- route each row onto the bounded queue of its table;
//!    full queues block the decoder, which is the only backpressure
//! 4. **Copy** -- one consumer per table streams its queue into
//!    `COPY ... FROM STDIN` over a dedicated pool session
//!
//! # Architecture
//!
//! The pipeline is `1 + T` tasks for a dump feeding `T` tables: a blocking
//! producer (reader → decoder → projector → fan-out) and `T` async copy
//! consumers, joined by the coordinator in [`pipeline::run_import`]. The
//! decoded dataset is never materialized; rows only live long enough to
//! cross a queue. Queues are strict FIFO per table; nothing is promised
//! across tables.
//!
//! # Key Modules
//!
//! - [`dump`] -- filename convention, dump type, gzip-transparent reader
//! - [`decoder`] -- streaming XML pull-parser producing typed entities
//! - [`models`] -- entity records and the normalization pass
//! - [`tables`] -- the ten target tables and their column orders
//! - [`project`] -- entity → row-bundle projection
//! - [`copy`] -- COPY text encoding and the per-table bulk-load consumer
//! - [`pipeline`] -- truncate, spawn, fan out, join, report
//! - [`config`] -- tuning constants

pub mod config;
pub mod copy;
pub mod decoder;
pub mod dump;
pub mod models;
pub mod pipeline;
pub mod project;
pub mod tables;
