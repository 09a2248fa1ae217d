/// The stored workspace document. The DB layer treats `body` as opaque JSON
/// so it does not depend on the domain crate.
pub struct SnapshotRow {
    pub body: String,
    /// RFC 3339, UTC.
    pub saved_at: String,
}
