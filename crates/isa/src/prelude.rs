//! Convenient re-exports.
//!
//! ```
//! use fwgen_isa::prelude::*;
//! ```

#[doc(inline)]
pub use crate::config::FirmwareGenConfig;
#[doc(inline)]
pub use crate::family::{
    EXCLUDED_TRIPLES, ISA_FAMILIES, IsaFamily, MULTI_ISA_AFFINITY, affinity_for, get_family,
    get_family_for_triple,
};
pub use crate::error::{Error, Result};
