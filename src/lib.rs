pub mod api;
pub mod common;
pub mod errors;
pub mod output;
pub mod transfer;
pub mod utils;

// Limits shared between the library and the CLI
pub mod config {
    /// Largest file accepted for upload. Checked before any network I/O;
    /// the service enforces its own cap, this one guards the client's
    /// bandwidth.
    pub const MAX_UPLOAD_SIZE_BYTES: u64 = 100 * 1024 * 1024; // 100 MiB

    /// Read granularity for the streaming upload body.
    pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;
}
