//! End-to-end invariants across extract → index → layout → assemble, using a small synthetic
//! blob cache instead of real cross-compiled objects.

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use fwgen_extract::BlobIndex;
use fwgen_isa::FirmwareGenConfig;
use fwgen_isa::family::get_family;
use fwgen_layout::{ImageLayout, LayoutEngine, SectionKind};

fn write_blob(objects_dir: &std::path::Path, family: &str, triple: &str, config: &str, program: &str, data: &[u8]) {
    let dir = objects_dir.join(family).join(triple).join(config);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{program}.bin")), data).unwrap();
}

fn synthetic_index() -> (tempfile::TempDir, Arc<BlobIndex>) {
    let dir = tempfile::tempdir().unwrap();
    for (family, triple) in [("arm32", "armv7-unknown-linux-gnueabi"), ("x86_64", "x86_64-unknown-linux-gnu")] {
        for program in ["alpha", "beta"] {
            write_blob(dir.path(), family, triple, "release", program, &vec![0xAB; 512]);
        }
    }
    let index = Arc::new(BlobIndex::new(dir.path()));
    (dir, index)
}

fn base_config(objects_dir: &std::path::Path, firmware_dir: &std::path::Path, seed: u64, count: usize) -> FirmwareGenConfig {
    FirmwareGenConfig {
        seed,
        num_images: count,
        min_size: 4096,
        max_size: 4096,
        multi_isa_probability: 0.0,
        parallel_jobs: 2,
        objects_dir: objects_dir.to_path_buf(),
        firmware_dir: firmware_dir.to_path_buf(),
        min_images_per_combo: 2,
        ..Default::default()
    }
}

fn assert_tiles_exactly(layout: &ImageLayout) {
    let mut sections = layout.sections.clone();
    sections.sort_by_key(|s| s.offset);

    assert_eq!(sections.first().unwrap().offset, 0, "first section must start at offset 0");
    let mut cursor = 0u64;
    for section in &sections {
        assert_eq!(section.offset, cursor, "section must start exactly where the previous one ended");
        cursor = section.end();
    }
    assert_eq!(cursor, layout.total_size, "sections must tile the whole image with no trailing gap");

    if layout.trailer_type != "none" {
        let trailer = sections.last().unwrap();
        assert_eq!(trailer.kind, SectionKind::Trailer, "trailer must be the final section when present");
    }

    let family = get_family(&layout.primary_isa).unwrap();
    for section in sections.iter().filter(|s| s.kind == SectionKind::Code) {
        assert_eq!(section.offset % u64::from(family.alignment), 0, "code sections must respect family alignment");
    }

    assert!(layout.all_isa_families.contains(&layout.primary_isa));
    assert!(!layout.all_isa_families.is_empty());
}

#[test]
fn every_layout_tiles_the_image_with_no_gaps_or_overlap() {
    let (_objects_dir, index) = synthetic_index();
    let firmware_dir = tempfile::tempdir().unwrap();
    let config = base_config(index.objects_dir(), firmware_dir.path(), 42, 12);

    let engine = LayoutEngine::new(Arc::clone(&index), config).unwrap();
    let layouts = engine.generate_batch(12, 42);

    assert_eq!(layouts.len(), 12);
    for layout in &layouts {
        assert_tiles_exactly(layout);
    }
}

#[test]
fn every_family_with_blobs_appears_as_a_primary_at_least_once() {
    let (_objects_dir, index) = synthetic_index();
    let firmware_dir = tempfile::tempdir().unwrap();
    let config = base_config(index.objects_dir(), firmware_dir.path(), 7, 20);

    let engine = LayoutEngine::new(Arc::clone(&index), config).unwrap();
    let layouts = engine.generate_batch(20, 7);

    let primaries: BTreeSet<&str> = layouts.iter().map(|l| l.primary_isa.as_str()).collect();
    for family in index.families() {
        assert!(primaries.contains(family), "family {family} never chosen as primary");
    }
}

#[test]
fn combo_floor_is_respected_when_feasible() {
    let (_objects_dir, index) = synthetic_index();
    let firmware_dir = tempfile::tempdir().unwrap();
    let mut config = base_config(index.objects_dir(), firmware_dir.path(), 3, 20);
    config.min_images_per_combo = 4;

    let engine = LayoutEngine::new(Arc::clone(&index), config.clone()).unwrap();
    let layouts = engine.generate_batch(20, 3);

    let mut combo_counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for layout in &layouts {
        *combo_counts.entry(layout.isa_label()).or_insert(0) += 1;
    }
    for count in combo_counts.values() {
        assert!(*count >= config.min_images_per_combo || *count == 0);
    }
}

#[test]
fn identical_seed_and_config_reproduce_bit_identical_images() {
    let (_objects_dir, index) = synthetic_index();

    let run = || {
        let firmware_dir = tempfile::tempdir().unwrap();
        let config = base_config(index.objects_dir(), firmware_dir.path(), 99, 5);
        let engine = LayoutEngine::new(Arc::clone(&index), config.clone()).unwrap();
        let layouts = engine.generate_batch(5, 99);

        let mut digests = Vec::new();
        for layout in &layouts {
            let result =
                fwgen_assemble::generate_single_image(layout, &config.objects_dir, firmware_dir.path()).unwrap();
            let bin_path = firmware_dir.path().join(&result.isa_label).join(format!("{}.bin", result.image_id));
            digests.push(fs::read(bin_path).unwrap());
        }
        digests
    };

    let first = run();
    let second = run();
    assert_eq!(first, second, "identical inputs must reproduce bit-identical images");
}

#[test]
fn trailer_bytes_equal_the_declared_checksum_over_the_preceding_bytes() {
    let (_objects_dir, index) = synthetic_index();
    let firmware_dir = tempfile::tempdir().unwrap();
    let mut config = base_config(index.objects_dir(), firmware_dir.path(), 5, 10);
    config.min_images_per_combo = 1;

    let engine = LayoutEngine::new(Arc::clone(&index), config.clone()).unwrap();
    let layouts = engine.generate_batch(10, 5);

    for layout in layouts.iter().filter(|l| l.trailer_type == "crc32") {
        let result =
            fwgen_assemble::generate_single_image(layout, &config.objects_dir, firmware_dir.path()).unwrap();
        let bin_path = firmware_dir.path().join(&result.isa_label).join(format!("{}.bin", result.image_id));
        let image = fs::read(bin_path).unwrap();
        let stored = u32::from_le_bytes(image[image.len() - 4..].try_into().unwrap());
        let expected = crc32fast::hash(&image[..image.len() - 4]);
        assert_eq!(stored, expected);
    }
}
