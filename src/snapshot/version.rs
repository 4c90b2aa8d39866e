/// Well-known version values of the snapshot store.
pub struct EtagVersion;

impl EtagVersion {
    /// No snapshot exists. Never a committed version.
    pub const NOT_FOUND: i64 = -1;

    /// As expected version: write without a concurrency check (rebuilds only).
    pub const ANY: i64 = -2;

    /// True for versions a write may commit.
    pub fn is_committed(version: i64) -> bool {
        version >= 0
    }
}
