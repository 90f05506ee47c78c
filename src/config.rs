/// Bounded capacity of each per-table row queue. The producer blocks on a
/// full queue, which is the pipeline's only backpressure mechanism.
pub const QUEUE_CAPACITY: usize = 1000;

/// Flush the COPY buffer to the server once it grows past this size.
pub const COPY_CHUNK_BYTES: usize = 128 * 1024;

/// Log decoding progress every N entities.
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Connections kept in the shared pool: one per concurrent COPY stream
/// (at most four tables per dump) plus headroom for truncation.
pub const POOL_MAX_CONNECTIONS: u32 = 8;
