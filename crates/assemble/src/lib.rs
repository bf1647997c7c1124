//! Renders [`fwgen_layout::ImageLayout`]s into firmware bytes, JSON sidecars, and a run-level
//! manifest.
//!
//! [`worker::generate_single_image`] renders one image; [`pipeline::generate_all`] fans a whole
//! batch out across worker threads the way [`fwgen_extract::BlobExtractor::extract_all`] fans
//! out extraction work.

pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod pool;
pub mod prelude;
pub mod worker;

pub use error::{Error, Result};
pub use manifest::FirmwareManifestBuilder;
pub use pipeline::{BatchOutcome, generate_all};
pub use worker::{GenerationResult, generate_single_image};

#[cfg(test)]
mod tests {
    use std::fs;

    use fwgen_layout::{ImageLayout, SectionKind, SectionSpec};
    use serde_json::json;

    use super::*;

    fn sample_layout() -> ImageLayout {
        ImageLayout {
            image_id: "img-test-0001".to_owned(),
            total_size: 4096,
            primary_isa: "arm32".to_owned(),
            header_type: "bare",
            trailer_type: "crc32",
            sections: vec![
                SectionSpec {
                    offset: 0,
                    size: 4092,
                    kind: SectionKind::Code,
                    alignment: 4,
                    isa_family: Some("arm32".to_owned()),
                    fill_params: json!({
                        "blob_triple": "armv7a-none-eabi",
                        "blob_config": "release",
                        "blob_program": "does_not_exist",
                    }),
                },
                SectionSpec {
                    offset: 4092,
                    size: 4,
                    kind: SectionKind::Trailer,
                    alignment: 1,
                    isa_family: None,
                    fill_params: json!({}),
                },
            ],
            all_isa_families: vec!["arm32".to_owned()],
            seed: 7,
        }
    }

    #[test]
    fn generated_image_has_a_self_consistent_trailer_and_sidecar() {
        let layout = sample_layout();
        let objects_dir = tempfile::tempdir().unwrap();
        let firmware_dir = tempfile::tempdir().unwrap();

        let result = generate_single_image(&layout, objects_dir.path(), firmware_dir.path()).unwrap();
        assert_eq!(result.size_bytes, 4096);
        assert_eq!(result.primary_isa, "arm32");

        let bin_path = firmware_dir.path().join("arm32").join("img-test-0001.bin");
        let image = fs::read(&bin_path).unwrap();
        assert_eq!(image.len(), 4096);

        let stored_crc = u32::from_le_bytes(image[4092..4096].try_into().unwrap());
        let expected_crc = crc32fast::hash(&image[..4092]);
        assert_eq!(stored_crc, expected_crc);

        // No real blob was found, so the code section should keep its 0xFF erase pattern.
        assert!(image[..4092].iter().all(|&b| b == 0xFF));

        let json_path = firmware_dir.path().join("arm32").join("img-test-0001.json");
        let metadata: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(metadata["image"]["id"], "img-test-0001");
        assert_eq!(metadata["structure"]["trailer_type"], "crc32");
    }

    #[test]
    fn batch_pipeline_reports_every_image_through_the_manifest() {
        let layouts = vec![sample_layout()];
        let objects_dir = tempfile::tempdir().unwrap();
        let firmware_dir = tempfile::tempdir().unwrap();

        let config = fwgen_isa::FirmwareGenConfig { parallel_jobs: 2, ..Default::default() };
        let outcome = generate_all(&layouts, objects_dir.path(), firmware_dir.path(), &config);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 0);

        outcome.manifest.save(firmware_dir.path(), &config).unwrap();
        assert!(firmware_dir.path().join("manifest.json").exists());
        assert!(firmware_dir.path().join("images.jsonl").exists());
    }
}
