//! ELF `.o` → raw binary extraction and blob indexing.
//!
//! [`extractor::BlobExtractor`] shells out to an external `objcopy`-compatible tool to pull the
//! `.text` section out of cross-compiled object files, caching by mtime. [`index::BlobIndex`]
//! then scans the resulting tree and serves random blobs to the layout/assembly phases.

pub mod error;
pub mod extractor;
pub mod index;
pub mod prelude;

pub use error::{Error, Result};
pub use extractor::{BlobExtractor, ExtractionResult};
pub use index::{BlobIndex, BlobInfo};
