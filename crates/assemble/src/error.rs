use std::path::PathBuf;

use snafu::prelude::*;

/// Error conditions raised while rendering an image or writing manifests.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("failed to create output directory {path:?}: {source}"))]
    CreateOutputDir { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to write image bytes to {path:?}: {source}"))]
    WriteImage { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to write sidecar metadata to {path:?}: {source}"))]
    WriteMetadata { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to serialize metadata: {source}"))]
    SerializeMetadata { source: serde_json::Error },

    #[snafu(display("failed to write manifest to {path:?}: {source}"))]
    WriteManifest { path: PathBuf, source: std::io::Error },
}

pub type Result<T> = core::result::Result<T, Error>;
