use serde::{Deserialize, Serialize};

/// Current on-disk layout of every learning-state file.
pub const SCHEMA_VERSION: u32 = 1;

/// Envelope written around each persisted payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    pub schema_version: u32,
    /// Seconds since the Unix epoch.
    pub saved_at: u64,
    pub data: T,
}

impl<T> Document<T> {
    pub fn new(data: T, saved_at: u64) -> Self {
        Document {
            schema_version: SCHEMA_VERSION,
            saved_at,
            data,
        }
    }
}

/// Just enough of a document to check its version before parsing the payload.
#[derive(Debug, Deserialize)]
pub(super) struct Header {
    pub schema_version: u32,
}
