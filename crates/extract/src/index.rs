//! In-memory index over previously extracted binary blobs, used by the layout and assembly
//! phases to pick section contents.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{ReadBlobSnafu, Result};
use snafu::prelude::*;

/// Metadata about a single cached blob file.
#[derive(Clone, Debug)]
pub struct BlobInfo {
    pub path: PathBuf,
    pub family: String,
    pub triple: String,
    pub config: String,
    pub program: String,
    pub size_bytes: u64,
}

/// Index of extracted binary blobs, keyed by ISA family.
pub struct BlobIndex {
    objects_dir: PathBuf,
    blobs_by_family: BTreeMap<String, Vec<BlobInfo>>,
}

impl BlobIndex {
    /// Scans `objects_dir` for `{family}/{triple}/{config}/{prog}.bin` files and indexes them.
    #[must_use]
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        let objects_dir = objects_dir.into();
        let blobs_by_family = scan(&objects_dir);
        let total: usize = blobs_by_family.values().map(Vec::len).sum();
        log::info!("Indexed {total} blobs across {} families", blobs_by_family.len());
        Self { objects_dir, blobs_by_family }
    }

    #[must_use]
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// ISA families with at least one indexed blob, sorted.
    #[must_use]
    pub fn families(&self) -> Vec<&str> {
        self.blobs_by_family.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn blob_count(&self, family: &str) -> usize {
        self.blobs_by_family.get(family).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn get_blobs(&self, family: &str) -> &[BlobInfo] {
        self.blobs_by_family.get(family).map_or(&[], Vec::as_slice)
    }

    /// Picks a uniformly random blob for `family`, or `None` if the family has no blobs indexed.
    pub fn get_random_blob(&self, family: &str, rng: &mut impl Rng) -> Option<&BlobInfo> {
        self.get_blobs(family).choose(rng)
    }

    /// Reads the raw bytes backing `blob`.
    ///
    /// # Errors
    /// Returns [`Error::ReadBlob`](crate::error::Error::ReadBlob) if the file cannot be read.
    pub fn get_blob_data(&self, blob: &BlobInfo) -> Result<Vec<u8>> {
        fs::read(&blob.path).context(ReadBlobSnafu { path: blob.path.clone() })
    }

    /// Family → blob count, sorted by family name.
    #[must_use]
    pub fn summary(&self) -> BTreeMap<String, usize> {
        self.blobs_by_family.iter().map(|(family, blobs)| (family.clone(), blobs.len())).collect()
    }
}

fn scan(objects_dir: &Path) -> BTreeMap<String, Vec<BlobInfo>> {
    let mut blobs_by_family: BTreeMap<String, Vec<BlobInfo>> = BTreeMap::new();

    if !objects_dir.exists() {
        log::warn!("Objects directory does not exist: {}", objects_dir.display());
        return blobs_by_family;
    }

    let mut found = Vec::new();
    let mut stack = vec![objects_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "bin") {
                found.push(path);
            }
        }
    }
    found.sort();

    for bin_file in found {
        let Ok(rel) = bin_file.strip_prefix(objects_dir) else { continue };
        let parts: Vec<_> = rel.components().collect();
        if parts.len() < 4 {
            continue;
        }
        let Ok(metadata) = fs::metadata(&bin_file) else { continue };
        if metadata.len() == 0 {
            continue;
        }

        let family = parts[0].as_os_str().to_string_lossy().into_owned();
        let triple = parts[1].as_os_str().to_string_lossy().into_owned();
        let config = parts[2].as_os_str().to_string_lossy().into_owned();
        let program = bin_file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();

        blobs_by_family.entry(family.clone()).or_default().push(BlobInfo {
            path: bin_file,
            family,
            triple,
            config,
            program,
            size_bytes: metadata.len(),
        });
    }

    blobs_by_family
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn missing_objects_dir_yields_empty_index() {
        let index = BlobIndex::new("/nonexistent/path/for/test");
        assert!(index.families().is_empty());
        assert_eq!(index.blob_count("arm32"), 0);
    }

    #[test]
    fn scan_indexes_nested_family_triple_config_layout() {
        let dir = tempfile::tempdir().unwrap();
        let blob_dir = dir.path().join("arm32").join("arm-unknown-linux-gnueabi").join("release");
        fs::create_dir_all(&blob_dir).unwrap();
        fs::write(blob_dir.join("prog.bin"), vec![1, 2, 3, 4]).unwrap();

        let index = BlobIndex::new(dir.path());
        assert_eq!(index.families(), vec!["arm32"]);
        assert_eq!(index.blob_count("arm32"), 1);

        let blob = &index.get_blobs("arm32")[0];
        assert_eq!(blob.program, "prog");
        assert_eq!(index.get_blob_data(blob).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_blob_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let blob_dir = dir.path().join("x86").join("i686-unknown-linux-gnu").join("debug");
        fs::create_dir_all(&blob_dir).unwrap();
        fs::write(blob_dir.join("empty.bin"), Vec::<u8>::new()).unwrap();

        let index = BlobIndex::new(dir.path());
        assert_eq!(index.blob_count("x86"), 0);
    }

    #[test]
    fn get_random_blob_is_deterministic_for_a_fixed_seed() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            let blob_dir = dir.path().join("arm32").join("t").join("c");
            fs::create_dir_all(&blob_dir).unwrap();
            fs::write(blob_dir.join(format!("{name}.bin")), vec![0u8; 8]).unwrap();
        }
        let index = BlobIndex::new(dir.path());
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        let a = index.get_random_blob("arm32", &mut rng_a).unwrap().program.clone();
        let b = index.get_random_blob("arm32", &mut rng_b).unwrap().program.clone();
        assert_eq!(a, b);
    }
}
