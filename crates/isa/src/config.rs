//! Top-level configuration for a firmware generation run.

use std::path::PathBuf;

/// Configuration for firmware image generation.
///
/// Mirrors the CLI surface exposed by the `generate` subcommand; construct via
/// [`FirmwareGenConfig::default`] and override individual fields, rather than building one from
/// scratch.
#[derive(Clone, Debug)]
pub struct FirmwareGenConfig {
    pub seed: u64,
    pub num_images: usize,
    pub min_size: u64,
    pub max_size: u64,
    pub multi_isa_probability: f64,
    pub parallel_jobs: usize,
    pub oracle_output_dir: PathBuf,
    pub objects_dir: PathBuf,
    pub firmware_dir: PathBuf,
    /// `None` means every known family is eligible.
    pub families: Option<Vec<String>>,
    pub min_images_per_combo: usize,
    pub force_extract: bool,
    pub verbose: bool,
}

impl Default for FirmwareGenConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_images: 1000,
            min_size: 4096,
            max_size: 16 * 1024 * 1024,
            multi_isa_probability: 0.15,
            parallel_jobs: 8,
            oracle_output_dir: PathBuf::from("../output"),
            objects_dir: PathBuf::from("../objects"),
            firmware_dir: PathBuf::from("../firmware"),
            families: None,
            min_images_per_combo: 20,
            force_extract: false,
            verbose: false,
        }
    }
}

impl FirmwareGenConfig {
    /// Families eligible for this run, defaulting to every known family when unrestricted.
    #[must_use]
    pub fn eligible_families(&self) -> Vec<&'static str> {
        match &self.families {
            Some(names) => crate::family::ISA_FAMILIES
                .iter()
                .filter(|family| names.iter().any(|n| n == family.name))
                .map(|family| family.name)
                .collect(),
            None => crate::family::ISA_FAMILIES.iter().map(|family| family.name).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = FirmwareGenConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.num_images, 1000);
        assert_eq!(config.min_size, 4096);
        assert_eq!(config.max_size, 16 * 1024 * 1024);
        assert!((config.multi_isa_probability - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn unrestricted_config_is_eligible_for_every_family() {
        let config = FirmwareGenConfig::default();
        assert_eq!(config.eligible_families().len(), crate::family::ISA_FAMILIES.len());
    }

    #[test]
    fn restricted_config_only_includes_named_families() {
        let mut config = FirmwareGenConfig::default();
        config.families = Some(vec!["arm32".to_owned(), "thumb".to_owned()]);
        let eligible = config.eligible_families();
        assert_eq!(eligible.len(), 2);
        assert!(eligible.contains(&"arm32"));
    }
}
