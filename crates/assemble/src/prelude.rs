//! Convenient re-exports.
//!
//! ```
//! use fwgen_assemble::prelude::*;
//! ```

#[doc(inline)]
pub use crate::error::{Error, Result};
#[doc(inline)]
pub use crate::manifest::FirmwareManifestBuilder;
#[doc(inline)]
pub use crate::pipeline::{BatchOutcome, generate_all};
#[doc(inline)]
pub use crate::worker::{GenerationResult, generate_single_image};
