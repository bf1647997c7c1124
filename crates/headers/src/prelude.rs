//! Convenient re-exports.
//!
//! ```
//! use fwgen_headers::prelude::*;
//! ```

#[doc(inline)]
pub use crate::header::{HeaderKind, HeaderParams, HeaderResult, generate_header};
#[doc(inline)]
pub use crate::trailer::{TrailerKind, TrailerResult, generate_trailer};
pub use crate::error::{Error, Result};
