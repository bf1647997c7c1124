//! Convenient re-exports.
//!
//! ```
//! use fwgen_extract::prelude::*;
//! ```

#[doc(inline)]
pub use crate::extractor::{BlobExtractor, ExtractionResult};
#[doc(inline)]
pub use crate::index::{BlobIndex, BlobInfo};
pub use crate::error::{Error, Result};
