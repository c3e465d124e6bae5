//! Gauge guard carried by every allocated control block.

/// Counts its control block in the open-connections gauge for as long as the
/// block lives.
pub(super) struct OpenConnection;

impl OpenConnection {
    pub(super) fn new() -> Self {
        crate::metrics::inc_connections();
        Self
    }
}

impl Drop for OpenConnection {
    fn drop(&mut self) { crate::metrics::dec_connections(); }
}
