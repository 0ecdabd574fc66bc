//! Format constants and tuning defaults.
//!
//! Values a caller may want to change live in [`Config`](crate::config::Config);
//! the defaults below seed it.

// ============================================================================
// Store format
// ============================================================================

/// Marker that opens every store file: uppercase SHA-1 of `NXFS24757`.
pub const STORE_MAGIC: &str = "AF42A720D65A556EB5CBE7DA5F0E0098379708C8";

/// Default file name of a store placed next to a release.
pub const STORE_FILE_NAME: &str = ".nx_store";

/// Key of the reserved internal block inside an entry's `nx` metadata.
pub const INTERNAL_META_KEY: &str = "@internal";

// ============================================================================
// Torrent layout
// ============================================================================

/// Directory name BEP-47 clients use for padding files.
pub const PADDING_FILE_DIR: &str = ".____padding_file";

// ============================================================================
// Placement
// ============================================================================

/// Parent directories searched for the release root during auto-strip-root.
pub const ROOT_SEARCH_DEPTH: usize = 4;

// ============================================================================
// Verification tuning
// ============================================================================

/// Upper bound on a single read when streaming file data into the hasher.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Pieces hashed concurrently in one verification batch.
pub const DEFAULT_VERIFY_CONCURRENCY: usize = 16;

/// File handles kept open at once during a verification.
pub const DEFAULT_MAX_OPEN_FILES: usize = 32;
