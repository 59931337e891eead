//! Store options.

/// Deflate level used when nothing else is configured.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 7;

/// Extra doubles appended to every row buffer.
///
/// The legacy row layout reserves leading bookkeeping slots, so buffers handed
/// across the conversion boundary carry this many spare elements.
pub const DEFAULT_ROW_SLACK: usize = 3;

/// Table count above which creation is refused.
pub const DEFAULT_MAX_TABLES: usize = 500;

/// Options for creating and opening matrix stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Deflate level for row chunks, `0` stores rows uncompressed (default: 7).
    pub compression_level: u32,
    /// Spare elements in buffers from `allocate_row_buffer` (default: 3).
    pub row_slack: usize,
    /// Soft cap on tables per container (default: 500).
    pub max_tables: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            row_slack: DEFAULT_ROW_SLACK,
            max_tables: DEFAULT_MAX_TABLES,
        }
    }
}

impl StoreOptions {
    /// Create store options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deflate level, clamped to `0..=9`.
    #[must_use]
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Set the row buffer slack.
    #[must_use]
    pub fn with_row_slack(mut self, slack: usize) -> Self {
        self.row_slack = slack;
        self
    }

    /// Set the table cap.
    #[must_use]
    pub fn with_max_tables(mut self, limit: usize) -> Self {
        self.max_tables = limit;
        self
    }
}
