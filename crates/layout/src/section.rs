//! Section kinds and per-section layout specs.

use serde_json::Value;

/// The kind of content a section holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    Code,
    Padding,
    StringTable,
    Filesystem,
    Random,
    Rodata,
    Trailer,
}

impl SectionKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Code => "code",
            Self::Padding => "padding",
            Self::StringTable => "string_table",
            Self::Filesystem => "filesystem",
            Self::Random => "random",
            Self::Rodata => "rodata",
            Self::Trailer => "trailer",
        }
    }
}

/// Layout specification for a single section of a firmware image.
///
/// `offset`/`size` describe where this section sits in the final image; the assembler is
/// responsible for rendering `fill_params` into actual bytes.
#[derive(Clone, Debug)]
pub struct SectionSpec {
    pub offset: u64,
    pub size: u64,
    pub kind: SectionKind,
    pub alignment: u32,
    /// Populated only for [`SectionKind::Code`].
    pub isa_family: Option<String>,
    pub fill_params: Value,
}

impl SectionSpec {
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}
