//! ISA family database and firmware generation configuration.
//!
//! [`family::ISA_FAMILIES`] groups the Rust target triples the rest of the pipeline cares about
//! into firmware-relevant families: shared endianness, pointer width, entry-point convention, and
//! plausible boot headers. [`config::FirmwareGenConfig`] is the configuration record threaded
//! through the extract/layout/assemble phases.

pub mod config;
pub mod error;
pub mod family;
pub mod prelude;

pub use config::FirmwareGenConfig;
pub use error::{Error, Result};
pub use family::{
    EXCLUDED_TRIPLES, ISA_FAMILIES, IsaFamily, MULTI_ISA_AFFINITY, affinity_for, get_family,
    get_family_for_triple,
};
