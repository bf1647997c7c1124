//! Per-image section layout engine for synthetic firmware images.
//!
//! [`engine::LayoutEngine`] picks the primary/secondary ISA families, header and trailer kinds,
//! total image size, and the full ordered section list for one image; [`engine::LayoutEngine::generate_batch`]
//! additionally enforces per-family and per-ISA-combination minimums across a whole run.

pub mod engine;
pub mod error;
pub mod image;
pub mod prelude;
pub mod section;

pub use engine::LayoutEngine;
pub use error::{Error, Result};
pub use image::ImageLayout;
pub use section::{SectionKind, SectionSpec};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fwgen_extract::BlobIndex;
    use fwgen_isa::FirmwareGenConfig;

    use super::*;

    #[test]
    fn engine_construction_fails_without_any_blobs() {
        let index = Arc::new(BlobIndex::new("/nonexistent/for/layout/test"));
        let config = FirmwareGenConfig::default();
        assert!(LayoutEngine::new(index, config).is_err());
    }
}
