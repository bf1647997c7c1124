//! ISA-specific boot header and trailer generators for synthetic firmware images.
//!
//! This crate replaces a string-keyed registry of generator callbacks with an exhaustively
//! matched tagged union: [`header::HeaderKind`] and [`trailer::TrailerKind`] are closed enums, and
//! [`header::generate_header`]/[`trailer::generate_trailer`] are the sole dispatch points. Adding a
//! new header/trailer kind is a compiler-enforced exercise: every `match` on the enum must be
//! extended before the crate builds again.

pub mod error;
pub mod header;
pub mod prelude;
pub mod trailer;

pub use error::{Error, Result};
pub use header::{HeaderKind, HeaderParams, HeaderResult, generate_header};
pub use trailer::{TrailerKind, TrailerResult, generate_trailer};

#[cfg(test)]
mod tests {
    use super::*;
    use fwgen_core::data::Endian;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(endianness: Endian) -> HeaderParams<'static> {
        HeaderParams { endianness, base_addr: 0x0800_0000, total_size: 0x10000, family_name: "arm32" }
    }

    #[test]
    fn cortexm_reset_vector_has_thumb_bit_set() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = generate_header(HeaderKind::VectorTableCortexM, &mut rng, &params(Endian::Little));
        let reset = u32::from_le_bytes(result.data[4..8].try_into().unwrap());
        assert_eq!(reset & 1, 1);
    }

    #[test]
    fn uboot_header_crc_is_self_consistent() {
        let mut rng = StdRng::seed_from_u64(2);
        let result = generate_header(HeaderKind::UBoot, &mut rng, &params(Endian::Big));
        assert_eq!(result.data.len(), 64);
        let mut zeroed = result.data.clone();
        zeroed[4..8].fill(0);
        let expected = crc32fast::hash(&zeroed);
        let stored = u32::from_be_bytes(result.data[4..8].try_into().unwrap());
        assert_eq!(stored, expected);
        assert_eq!(&result.data[0..4], &0x2705_1956u32.to_be_bytes());
    }

    #[test]
    fn bios_boot_has_boot_signature() {
        let mut rng = StdRng::seed_from_u64(3);
        let result = generate_header(HeaderKind::BiosBoot, &mut rng, &params(Endian::Little));
        assert_eq!(result.data.len(), 512);
        assert_eq!(result.data[510], 0x55);
        assert_eq!(result.data[511], 0xAA);
        assert_eq!(result.data[0], 0xEB);
    }

    #[test]
    fn uefi_stub_has_mz_and_pe_magic() {
        let mut rng = StdRng::seed_from_u64(4);
        let result = generate_header(HeaderKind::UefiStub, &mut rng, &params(Endian::Little));
        assert_eq!(&result.data[0..2], b"MZ");
        assert_eq!(&result.data[0x80..0x84], b"PE\0\0");
    }

    #[test]
    fn bare_header_is_empty() {
        let result = generate_header(HeaderKind::Bare, &mut StdRng::seed_from_u64(5), &params(Endian::Little));
        assert!(result.data.is_empty());
        assert_eq!(result.entry_point_offset, 0);
    }

    #[test]
    fn generation_is_deterministic_for_a_fixed_seed() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a = generate_header(HeaderKind::VectorTableArm, &mut rng_a, &params(Endian::Little));
        let b = generate_header(HeaderKind::VectorTableArm, &mut rng_b, &params(Endian::Little));
        assert_eq!(a.data, b.data);
    }
}
