//! Errors from loading machine descriptions, ROM images and programs.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum C64Error {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} ROM must be {expected} bytes, got {actual}")]
    RomSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid machine description: {0}")]
    Config(#[from] serde_json::Error),

    #[error("PRG image too short ({0} bytes): needs a load address and at least one byte")]
    PrgTooShort(usize),
}

pub type Result<T> = std::result::Result<T, C64Error>;
