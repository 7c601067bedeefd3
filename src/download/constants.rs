//! Constants for the download module.

/// Bytes requested per ranged GET after the first partial response (10 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Suffix of the file that collects ranged chunks until the transfer ends.
pub const PART_FILE_SUFFIX: &str = ".part";

/// Write buffer for streamed bodies.
pub(crate) const WRITE_BUFFER_BYTES: usize = 64 * 1024;
