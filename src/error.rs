use std::path::PathBuf;

use thiserror::Error;

/// Errors that may occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The serial device could not be opened.
    #[error("Could not open `{path}`: {source}")]
    OpenPort {
        /// The device path that was requested.
        path: String,

        /// What the serial driver had to say about it.
        source: tokio_serial::Error,
    },

    /// A configuration file could not be read or parsed.
    #[error("Could not load configuration from `{path}`: {problem}")]
    Config {
        /// The file that was requested.
        path: PathBuf,

        /// The read or parse issue.
        problem: String,
    },

    /// The requested bit rate cannot be realized on any line.
    #[error("A bit rate of {0} is not usable")]
    BadRate(u32),

    /// Device-level I/O failed. Fatal to the readiness loop.
    #[error("Link I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The received stream broke in a way that cannot be explained by a
    /// single inserted, corrupted or dropped byte, and the restart policy
    /// says to give up.
    #[error(
        "Unable to resync: read {read:#04x}, previous {prev:#04x}, before that {prev2:#04x}"
    )]
    Desync {
        /// The byte that arrived after the sync break.
        read: u8,

        /// The byte that broke the successor invariant.
        prev: u8,

        /// The last byte that still made sense.
        prev2: u8,
    },
}
