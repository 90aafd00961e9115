//! Why a scan is running
//!
//! The same visibility rules serve three kinds of scans. A user read answers
//! one transaction's query. Flushes and minor compactions rewrite data but
//! must keep delete markers, because older versions may still live in store
//! files outside this rewrite. Major compactions see every store file and may
//! drop markers together with the data they shadow.

/// The kind of scan a filter is installed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanPurpose {
    /// A client read on behalf of one transaction
    UserScan,
    /// Flush or minor compaction: delete markers are written back out
    CompactRetainDeletes,
    /// Major compaction: delete markers and expired data may be purged
    CompactDropDeletes,
}

impl ScanPurpose {
    /// Whether every version passing the visibility rules is kept, rather
    /// than only the newest per column
    ///
    /// Flush and compaction must not collapse history that in-progress
    /// readers may still need.
    pub fn retains_versions(self) -> bool {
        !matches!(self, ScanPurpose::UserScan)
    }

    /// Whether visible delete markers are written back out
    pub fn retains_delete_markers(self) -> bool {
        matches!(self, ScanPurpose::CompactRetainDeletes)
    }

    /// Whether skipped data is physically purged by this scan
    pub fn purges(self) -> bool {
        matches!(self, ScanPurpose::CompactDropDeletes)
    }

    /// Short name for logs
    pub fn name(self) -> &'static str {
        match self {
            ScanPurpose::UserScan => "user_scan",
            ScanPurpose::CompactRetainDeletes => "compact_retain_deletes",
            ScanPurpose::CompactDropDeletes => "compact_drop_deletes",
        }
    }
}
