//! Complete per-image layout.

use crate::section::{SectionKind, SectionSpec};

/// Complete layout specification for one firmware image.
#[derive(Clone, Debug)]
pub struct ImageLayout {
    pub image_id: String,
    pub total_size: u64,
    pub primary_isa: String,
    pub header_type: &'static str,
    pub trailer_type: &'static str,
    pub sections: Vec<SectionSpec>,
    pub all_isa_families: Vec<String>,
    pub seed: u64,
}

impl ImageLayout {
    /// Directory label: sorted ISA families joined with `+`.
    #[must_use]
    pub fn isa_label(&self) -> String {
        let mut families = self.all_isa_families.clone();
        families.sort();
        families.join("+")
    }

    #[must_use]
    pub fn is_multi_isa(&self) -> bool {
        self.all_isa_families.len() > 1
    }

    #[must_use]
    pub fn code_sections(&self) -> Vec<&SectionSpec> {
        self.sections.iter().filter(|s| s.kind == SectionKind::Code).collect()
    }

    #[must_use]
    pub fn code_bytes(&self) -> u64 {
        self.code_sections().iter().map(|s| s.size).sum()
    }
}
