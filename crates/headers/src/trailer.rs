//! Image trailers: checksums computed over everything written before them.

use serde_json::{Value, json};
use sha2::Digest;

/// Every trailer kind this generator knows how to synthesize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TrailerKind {
    Crc32,
    Md5,
    Sha256,
    None,
}

impl TrailerKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Crc32 => "crc32",
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::None => "none",
        }
    }

    /// Byte size of the trailer, used by the layout engine to size the reserved section.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Crc32 => 4,
            Self::Md5 => 16,
            Self::Sha256 => 32,
            Self::None => 0,
        }
    }

    /// Relative selection weight out of 100, mirroring the non-code section weighting scheme.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Crc32 => 40,
            Self::Md5 => 20,
            Self::Sha256 => 10,
            Self::None => 30,
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Crc32, Self::Md5, Self::Sha256, Self::None]
    }

    /// Looks up a variant by its [`name`](Self::name).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.name() == name)
    }
}

/// Output of a trailer generator.
#[derive(Clone, Debug)]
pub struct TrailerResult {
    pub data: Vec<u8>,
    pub trailer_type: &'static str,
    pub metadata: Value,
}

/// Computes a trailer of the requested kind over `preceding`, which must be every byte of the
/// image written before the trailer's offset.
#[must_use]
pub fn generate_trailer(kind: TrailerKind, preceding: &[u8]) -> TrailerResult {
    match kind {
        TrailerKind::Crc32 => {
            let crc = crc32fast::hash(preceding);
            TrailerResult {
                data: crc.to_le_bytes().to_vec(),
                trailer_type: kind.name(),
                metadata: json!({ "algorithm": "crc32" }),
            }
        }
        TrailerKind::Md5 => {
            let digest = md5::compute(preceding);
            TrailerResult {
                data: digest.0.to_vec(),
                trailer_type: kind.name(),
                metadata: json!({ "algorithm": "md5" }),
            }
        }
        TrailerKind::Sha256 => {
            let mut hasher = sha2::Sha256::new();
            hasher.update(preceding);
            TrailerResult {
                data: hasher.finalize().to_vec(),
                trailer_type: kind.name(),
                metadata: json!({ "algorithm": "sha256" }),
            }
        }
        TrailerKind::None => TrailerResult {
            data: Vec::new(),
            trailer_type: kind.name(),
            metadata: json!({}),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_round_trips() {
        let data = b"some firmware bytes before the trailer";
        let trailer = generate_trailer(TrailerKind::Crc32, data);
        assert_eq!(trailer.data.len(), 4);
        let stored = u32::from_le_bytes(trailer.data.clone().try_into().unwrap());
        assert_eq!(stored, crc32fast::hash(data));
    }

    #[test]
    fn md5_is_sixteen_bytes() {
        let trailer = generate_trailer(TrailerKind::Md5, b"payload");
        assert_eq!(trailer.data.len(), 16);
    }

    #[test]
    fn sha256_is_thirty_two_bytes() {
        let trailer = generate_trailer(TrailerKind::Sha256, b"payload");
        assert_eq!(trailer.data.len(), 32);
    }

    #[test]
    fn none_is_empty() {
        let trailer = generate_trailer(TrailerKind::None, b"payload");
        assert!(trailer.data.is_empty());
    }

    #[test]
    fn weights_sum_to_one_hundred() {
        let total: u32 = TrailerKind::all().iter().map(|k| k.weight()).sum();
        assert_eq!(total, 100);
    }
}
