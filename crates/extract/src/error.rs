use std::path::PathBuf;

use snafu::prelude::*;

/// Error conditions raised while extracting or indexing blobs.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("failed to read blob at {path:?}: {source}"))]
    ReadBlob { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to create output directory {path:?}: {source}"))]
    CreateOutputDir { path: PathBuf, source: std::io::Error },

    #[snafu(display("objcopy invocation failed for {path:?}: {source}"))]
    SpawnObjcopy { path: PathBuf, source: std::io::Error },

    #[snafu(display("extraction of {path:?} timed out after {seconds}s"))]
    Timeout { path: PathBuf, seconds: u64 },
}

pub type Result<T> = core::result::Result<T, Error>;
