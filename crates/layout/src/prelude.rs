//! Convenient re-exports.
//!
//! ```
//! use fwgen_layout::prelude::*;
//! ```

#[doc(inline)]
pub use crate::engine::LayoutEngine;
#[doc(inline)]
pub use crate::image::ImageLayout;
#[doc(inline)]
pub use crate::section::{SectionKind, SectionSpec};
pub use crate::error::{Error, Result};
