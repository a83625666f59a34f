//! Error types for the device, loop and storage boundaries.
//!
//! The tree walk itself never fails: structural misuse renders an empty
//! buffer and cache downcast failures are plain misses.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Terminal or device I/O failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A storage backend rejected a read or write.
    #[error("storage backend failed for key `{key}`: {message}")]
    Storage { key: String, message: String },

    /// A stored value could not be encoded or decoded.
    #[error("stored value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
