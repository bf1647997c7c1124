//! ISA family database: the firmware-relevant grouping of Rust target triples used by the rest of
//! the pipeline, along with which header kinds are plausible for each family.

use fwgen_core::data::Endian;
use fwgen_headers::HeaderKind;

use crate::error::{Error, Result};

/// A firmware-relevant grouping of one or more target triples that share an entry-point
/// convention, endianness, and set of plausible boot headers.
#[derive(Clone, Copy, Debug)]
pub struct IsaFamily {
    pub name: &'static str,
    pub endianness: Endian,
    pub pointer_width: u8,
    pub triples: &'static [&'static str],
    pub header_types: &'static [HeaderKind],
    pub typical_base_addr: u64,
    pub alignment: u32,
}

use HeaderKind::{
    AndroidBoot, AvrVectorTable, Bare, BiosBoot, BootVectorMips, Msp430VectorTable, OpenSbiStub,
    QualcommMbn, TpLink, UBoot, UefiStub, VectorTableArm, VectorTableCortexM,
};

pub const ISA_FAMILIES: &[IsaFamily] = &[
    IsaFamily {
        name: "arm32",
        endianness: Endian::Little,
        pointer_width: 32,
        triples: &[
            "arm-unknown-linux-gnueabi",
            "arm-unknown-linux-gnueabihf",
            "armv7-unknown-linux-gnueabihf",
        ],
        header_types: &[VectorTableArm, UBoot, AndroidBoot, Bare],
        typical_base_addr: 0x0000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "thumb",
        endianness: Endian::Little,
        pointer_width: 32,
        triples: &["thumbv7m-none-eabi"],
        header_types: &[VectorTableCortexM, Bare],
        typical_base_addr: 0x0800_0000,
        alignment: 2,
    },
    IsaFamily {
        name: "aarch64",
        endianness: Endian::Little,
        pointer_width: 64,
        triples: &["aarch64-unknown-linux-gnu", "aarch64-unknown-linux-musl"],
        header_types: &[UBoot, AndroidBoot, Bare],
        typical_base_addr: 0x4000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "x86",
        endianness: Endian::Little,
        pointer_width: 32,
        triples: &["i686-unknown-linux-gnu"],
        header_types: &[BiosBoot, UefiStub, Bare],
        typical_base_addr: 0x0000_7C00,
        alignment: 1,
    },
    IsaFamily {
        name: "x86_64",
        endianness: Endian::Little,
        pointer_width: 64,
        triples: &["x86_64-unknown-linux-gnu", "x86_64-unknown-linux-musl"],
        header_types: &[UefiStub, BiosBoot, UBoot, Bare],
        typical_base_addr: 0x0010_0000,
        alignment: 1,
    },
    IsaFamily {
        name: "riscv32",
        endianness: Endian::Little,
        pointer_width: 32,
        triples: &["riscv32-unknown-linux-gnu", "riscv32-unknown-elf"],
        header_types: &[OpenSbiStub, UBoot, Bare],
        typical_base_addr: 0x8000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "riscv64",
        endianness: Endian::Little,
        pointer_width: 64,
        triples: &["riscv64-unknown-linux-gnu", "riscv64-unknown-elf"],
        header_types: &[OpenSbiStub, UBoot, Bare],
        typical_base_addr: 0x8000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "mips32_be",
        endianness: Endian::Big,
        pointer_width: 32,
        triples: &["mips-unknown-linux-gnu"],
        header_types: &[BootVectorMips, UBoot, TpLink, Bare],
        typical_base_addr: 0xBFC0_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "mips32_le",
        endianness: Endian::Little,
        pointer_width: 32,
        triples: &["mipsel-unknown-linux-gnu"],
        header_types: &[BootVectorMips, UBoot, TpLink, Bare],
        typical_base_addr: 0xBFC0_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "mips64_be",
        endianness: Endian::Big,
        pointer_width: 64,
        triples: &["mips64-unknown-linux-gnuabi64"],
        header_types: &[BootVectorMips, UBoot, Bare],
        typical_base_addr: 0xFFFF_FFFF_8000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "mips64_le",
        endianness: Endian::Little,
        pointer_width: 64,
        triples: &["mips64el-unknown-linux-gnuabi64"],
        header_types: &[BootVectorMips, UBoot, Bare],
        typical_base_addr: 0xFFFF_FFFF_8000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "ppc32",
        endianness: Endian::Big,
        pointer_width: 32,
        triples: &["powerpc-unknown-linux-gnu"],
        header_types: &[UBoot, Bare],
        typical_base_addr: 0x0000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "ppc64_be",
        endianness: Endian::Big,
        pointer_width: 64,
        triples: &["powerpc64-unknown-linux-gnu"],
        header_types: &[UBoot, Bare],
        typical_base_addr: 0x0000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "ppc64_le",
        endianness: Endian::Little,
        pointer_width: 64,
        triples: &["powerpc64le-unknown-linux-gnu"],
        header_types: &[UBoot, Bare],
        typical_base_addr: 0x0000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "sparc32",
        endianness: Endian::Big,
        pointer_width: 32,
        triples: &["sparc-unknown-linux-gnu"],
        header_types: &[UBoot, Bare],
        typical_base_addr: 0x0000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "sparc64",
        endianness: Endian::Big,
        pointer_width: 64,
        triples: &["sparc64-unknown-linux-gnu"],
        header_types: &[UBoot, Bare],
        typical_base_addr: 0x0000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "s390x",
        endianness: Endian::Big,
        pointer_width: 64,
        triples: &["s390x-unknown-linux-gnu"],
        header_types: &[UBoot, Bare],
        typical_base_addr: 0x0000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "loongarch64",
        endianness: Endian::Little,
        pointer_width: 64,
        triples: &["loongarch64-unknown-linux-gnu"],
        header_types: &[UBoot, Bare],
        typical_base_addr: 0x9000_0000_0000_0000,
        alignment: 4,
    },
    IsaFamily {
        name: "avr",
        endianness: Endian::Little,
        pointer_width: 16,
        triples: &["avr-unknown-unknown"],
        header_types: &[AvrVectorTable, Bare],
        typical_base_addr: 0x0000,
        alignment: 2,
    },
    IsaFamily {
        name: "msp430",
        endianness: Endian::Little,
        pointer_width: 16,
        triples: &["msp430-none-elf"],
        header_types: &[Msp430VectorTable, Bare],
        typical_base_addr: 0xC000,
        alignment: 2,
    },
    IsaFamily {
        name: "hexagon",
        endianness: Endian::Little,
        pointer_width: 32,
        triples: &["hexagon-unknown-linux-musl"],
        header_types: &[QualcommMbn, Bare],
        typical_base_addr: 0x0000_0000,
        alignment: 4,
    },
];

/// Target triples that are never firmware generation candidates, even if an object file for them
/// happens to be present in the blob corpus (GPU/WASM/BPF/vector-engine and other non-firmware
/// targets).
pub const EXCLUDED_TRIPLES: &[&str] = &[
    "wasm32-unknown-unknown",
    "wasm32-wasi",
    "nvptx64-nvidia-cuda",
    "amdgcn-amd-amdhsa",
    "bpf-unknown-none",
    "ve-unknown-linux-gnu",
    "lanai-unknown-unknown",
    "xcore-unknown-unknown",
];

/// Plausible multi-ISA co-location weights: `(primary, &[(secondary, weight), ...])`.
pub const MULTI_ISA_AFFINITY: &[(&str, &[(&str, f64)])] = &[
    ("arm32", &[("thumb", 3.0), ("aarch64", 1.0)]),
    ("thumb", &[("arm32", 3.0)]),
    ("aarch64", &[("arm32", 2.0), ("thumb", 1.0)]),
    ("x86_64", &[("x86", 2.0), ("arm32", 1.0)]),
    ("x86", &[("x86_64", 1.0)]),
    ("mips32_be", &[("mips32_le", 0.5)]),
    ("mips32_le", &[("mips32_be", 0.5)]),
    ("mips64_be", &[("mips32_be", 2.0)]),
    ("mips64_le", &[("mips32_le", 2.0)]),
    ("riscv64", &[("riscv32", 2.0)]),
    ("riscv32", &[("riscv64", 1.0)]),
    ("ppc64_be", &[("ppc32", 1.0)]),
    ("ppc64_le", &[("ppc32", 0.5)]),
    ("hexagon", &[("arm32", 2.0), ("aarch64", 1.0)]),
];

/// Looks up an ISA family by name.
///
/// # Errors
/// Returns [`Error::UnknownFamily`] if `name` does not match any entry in [`ISA_FAMILIES`].
pub fn get_family(name: &str) -> Result<&'static IsaFamily> {
    ISA_FAMILIES
        .iter()
        .find(|family| family.name == name)
        .ok_or_else(|| Error::UnknownFamily { name: name.to_owned() })
}

/// Returns the ISA family name that owns `triple`, or `None` if the triple is unknown or excluded.
#[must_use]
pub fn get_family_for_triple(triple: &str) -> Option<&'static str> {
    if EXCLUDED_TRIPLES.contains(&triple) {
        return None;
    }
    ISA_FAMILIES
        .iter()
        .find(|family| family.triples.contains(&triple))
        .map(|family| family.name)
}

/// Returns every target triple that is a valid firmware generation candidate.
#[must_use]
pub fn firmware_triples() -> Vec<&'static str> {
    ISA_FAMILIES.iter().flat_map(|family| family.triples.iter().copied()).collect()
}

/// Returns the weighted list of secondary families plausible alongside `primary` in a multi-ISA
/// image, or an empty slice if `primary` has no recorded affinities.
#[must_use]
pub fn affinity_for(primary: &str) -> &'static [(&'static str, f64)] {
    MULTI_ISA_AFFINITY
        .iter()
        .find(|(name, _)| *name == primary)
        .map_or(&[], |(_, secondaries)| *secondaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_family_is_findable_by_name() {
        for family in ISA_FAMILIES {
            assert_eq!(get_family(family.name).unwrap().name, family.name);
        }
    }

    #[test]
    fn unknown_family_errors() {
        assert!(get_family("not-a-real-family").is_err());
    }

    #[test]
    fn excluded_triples_never_resolve_to_a_family() {
        for triple in EXCLUDED_TRIPLES {
            assert_eq!(get_family_for_triple(triple), None);
        }
    }

    #[test]
    fn every_header_type_is_plausible_for_its_family() {
        for family in ISA_FAMILIES {
            assert!(!family.header_types.is_empty());
            assert!(family.header_types.contains(&HeaderKind::Bare));
        }
    }

    #[test]
    fn thirty_families_have_no_duplicate_triples() {
        let all = firmware_triples();
        let mut seen = hashbrown::HashSet::new();
        for triple in all {
            assert!(seen.insert(triple), "duplicate triple: {triple}");
        }
    }
}
