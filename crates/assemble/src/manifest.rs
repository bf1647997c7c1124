//! Collects per-image results across a run and writes `manifest.json` + `images.jsonl`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fwgen_core::time::now_utc_iso8601;
use fwgen_isa::FirmwareGenConfig;
use serde_json::{Value, json};
use snafu::prelude::*;

use crate::error::{Result, WriteManifestSnafu};
use crate::worker::GenerationResult;

/// Accumulates [`GenerationResult`]s and failure records for one run, then writes the manifest.
#[derive(Default)]
pub struct FirmwareManifestBuilder {
    results: Vec<GenerationResult>,
    errors: Vec<String>,
}

impl FirmwareManifestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: GenerationResult) {
        self.results.push(result);
    }

    pub fn add_error(&mut self, image_id: impl Into<String>) {
        self.errors.push(image_id.into());
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Writes `manifest.json` (summary stats) and `images.jsonl` (one line per image) into
    /// `firmware_dir`.
    ///
    /// # Errors
    /// Returns an error if either file cannot be written.
    pub fn save(&self, firmware_dir: &Path, config: &FirmwareGenConfig) -> Result<()> {
        let total_bytes: u64 = self.results.iter().map(|r| r.size_bytes).sum();
        let total_code: u64 = self.results.iter().map(|r| r.code_bytes).sum();
        let multi_isa_count = self.results.iter().filter(|r| r.is_multi_isa).count();

        let mut isa_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut dir_counts: BTreeMap<String, u64> = BTreeMap::new();
        for result in &self.results {
            *isa_counts.entry(result.primary_isa.clone()).or_insert(0) += 1;
            *dir_counts.entry(result.isa_label.clone()).or_insert(0) += 1;
        }

        let manifest = json!({
            "generator": "fwgen::assemble",
            "timestamp": now_utc_iso8601(),
            "config": {
                "seed": config.seed,
                "num_images": config.num_images,
                "min_size": config.min_size,
                "max_size": config.max_size,
                "multi_isa_probability": config.multi_isa_probability,
            },
            "summary": {
                "total_generated": self.results.len(),
                "total_failed": self.errors.len(),
                "total_bytes": total_bytes,
                "total_code_bytes": total_code,
                "avg_code_fraction": if total_bytes > 0 {
                    (total_code as f64 / total_bytes as f64 * 1000.0).round() / 1000.0
                } else {
                    0.0
                },
                "multi_isa_count": multi_isa_count,
                "multi_isa_fraction": if !self.results.is_empty() {
                    (multi_isa_count as f64 / self.results.len() as f64 * 1000.0).round() / 1000.0
                } else {
                    0.0
                },
                "isa_distribution": isa_counts,
                "directory_counts": dir_counts,
            },
        });

        let manifest_path = firmware_dir.join("manifest.json");
        let rendered = serde_json::to_vec_pretty(&manifest).context(crate::error::SerializeMetadataSnafu)?;
        fs::write(&manifest_path, rendered)
            .context(WriteManifestSnafu { path: manifest_path.clone() })?;

        let jsonl_path = firmware_dir.join("images.jsonl");
        let mut lines = String::new();
        for result in &self.results {
            let entry: Value = json!({
                "image_id": result.image_id,
                "size_bytes": result.size_bytes,
                "primary_isa": result.primary_isa,
                "isa_label": result.isa_label,
                "is_multi_isa": result.is_multi_isa,
                "num_sections": result.num_sections,
                "code_bytes": result.code_bytes,
                "duration_ms": result.duration_ms,
            });
            lines.push_str(&entry.to_string());
            lines.push('\n');
        }
        fs::write(&jsonl_path, lines).context(WriteManifestSnafu { path: jsonl_path.clone() })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(id: &str, isa: &str) -> GenerationResult {
        GenerationResult {
            image_id: id.to_owned(),
            size_bytes: 4096,
            primary_isa: isa.to_owned(),
            isa_label: isa.to_owned(),
            is_multi_isa: false,
            num_sections: 3,
            code_bytes: 2048,
            duration_ms: 5,
        }
    }

    #[test]
    fn save_writes_manifest_and_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = FirmwareManifestBuilder::new();
        builder.add_result(sample_result("img-0001", "arm32"));
        builder.add_result(sample_result("img-0002", "x86_64"));

        let config = FirmwareGenConfig::default();
        builder.save(dir.path(), &config).unwrap();

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("manifest.json")).unwrap()).unwrap();
        assert_eq!(manifest["summary"]["total_generated"], 2);

        let jsonl = fs::read_to_string(dir.path().join("images.jsonl")).unwrap();
        assert_eq!(jsonl.lines().count(), 2);
    }
}
