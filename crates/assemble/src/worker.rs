//! Renders one [`ImageLayout`] into firmware bytes plus its JSON sidecar.

use std::fs;
use std::path::Path;
use std::time::Instant;

use fwgen_core::time::now_utc_iso8601;
use fwgen_headers::{HeaderKind, HeaderParams, TrailerKind, generate_header, generate_trailer};
use fwgen_isa::family::get_family;
use fwgen_layout::{ImageLayout, SectionKind};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};
use sha2::Digest;
use snafu::prelude::*;

use crate::error::{CreateOutputDirSnafu, Result, WriteImageSnafu, WriteMetadataSnafu};
use crate::pool::{STRING_POOL, fs_magic};

/// Summary of one successfully generated image, used to build the run-level manifest.
#[derive(Clone, Debug)]
pub struct GenerationResult {
    pub image_id: String,
    pub size_bytes: u64,
    pub primary_isa: String,
    pub isa_label: String,
    pub is_multi_isa: bool,
    pub num_sections: usize,
    pub code_bytes: u64,
    pub duration_ms: u64,
}

/// Renders `layout` to bytes, writes `{firmware_dir}/{isa_label}/{image_id}.{bin,json}`, and
/// returns a summary for the manifest.
///
/// # Errors
/// Returns an error if the output directory or files cannot be written.
pub fn generate_single_image(
    layout: &ImageLayout,
    objects_dir: &Path,
    firmware_dir: &Path,
) -> Result<GenerationResult> {
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(layout.seed);

    let total_size = layout.total_size as usize;
    let mut image = vec![0xFFu8; total_size];
    let mut actual_sections: Vec<Value> = Vec::new();

    let family_info = get_family(&layout.primary_isa).ok();
    let endianness = family_info.map_or(fwgen_core::data::Endian::Little, |f| f.endianness);
    let base_addr = family_info.map_or(0, |f| f.typical_base_addr);

    for section in &layout.sections {
        let offset = section.offset as usize;
        let size = section.size as usize;

        match section.kind {
            SectionKind::Header => {
                let kind = HeaderKind::from_name(layout.header_type).unwrap_or(HeaderKind::Bare);
                let params = HeaderParams {
                    endianness,
                    base_addr,
                    total_size: layout.total_size,
                    family_name: &layout.primary_isa,
                };
                let result = generate_header(kind, &mut rng, &params);
                let actual_size = result.data.len().min(size);
                image[offset..offset + actual_size].copy_from_slice(&result.data[..actual_size]);

                actual_sections.push(json!({
                    "offset": offset,
                    "size": actual_size,
                    "type": "header",
                    "isa_family": Value::Null,
                    "details": result.metadata,
                }));
            }

            SectionKind::Code => {
                let isa_family = section.isa_family.clone().unwrap_or_default();
                let blob_triple = str_param(&section.fill_params, "blob_triple");
                let blob_program = str_param(&section.fill_params, "blob_program");
                let blob_config = str_param(&section.fill_params, "blob_config");

                let (code_data, source_triple, source_program, source_config) = read_blob(
                    objects_dir,
                    &isa_family,
                    &blob_triple,
                    &blob_config,
                    &blob_program,
                );

                if !code_data.is_empty() {
                    let mut written = 0usize;
                    while written < size {
                        let take = (size - written).min(code_data.len());
                        image[offset + written..offset + written + take]
                            .copy_from_slice(&code_data[..take]);
                        written += take;
                    }
                }

                actual_sections.push(json!({
                    "offset": offset,
                    "size": size,
                    "type": "code",
                    "isa_family": isa_family,
                    "source_triple": source_triple,
                    "source_program": source_program,
                    "source_config": source_config,
                }));
            }

            SectionKind::Padding => {
                let fill_byte = section.fill_params.get("fill_byte").and_then(Value::as_u64).unwrap_or(0xFF) as u8;
                image[offset..offset + size].fill(fill_byte);
                let pattern = section.fill_params.get("pattern").cloned().unwrap_or_else(|| json!("0xFF"));
                actual_sections.push(json!({
                    "offset": offset,
                    "size": size,
                    "type": "padding",
                    "isa_family": Value::Null,
                    "details": { "pattern": pattern },
                }));
            }

            SectionKind::StringTable => {
                let buf = fill_with_strings(&mut rng, size);
                image[offset..offset + size].copy_from_slice(&buf[..size]);
                actual_sections.push(json!({
                    "offset": offset,
                    "size": size,
                    "type": "string_table",
                    "isa_family": Value::Null,
                    "details": { "source": "generated" },
                }));
            }

            SectionKind::Filesystem => {
                let fs_type = section
                    .fill_params
                    .get("fs_type")
                    .and_then(Value::as_str)
                    .unwrap_or("squashfs")
                    .to_owned();
                let magic = fs_magic(&fs_type);
                let magic_len = magic.len().min(size);
                image[offset..offset + magic_len].copy_from_slice(&magic[..magic_len]);
                let mut rest = vec![0u8; size - magic_len];
                rng.fill(rest.as_mut_slice());
                image[offset + magic_len..offset + size].copy_from_slice(&rest);
                actual_sections.push(json!({
                    "offset": offset,
                    "size": size,
                    "type": "filesystem",
                    "isa_family": Value::Null,
                    "details": { "fs_type": fs_type },
                }));
            }

            SectionKind::Random => {
                let mut buf = vec![0u8; size];
                rng.fill(buf.as_mut_slice());
                image[offset..offset + size].copy_from_slice(&buf);
                actual_sections.push(json!({
                    "offset": offset,
                    "size": size,
                    "type": "random",
                    "isa_family": Value::Null,
                    "details": { "source": "random" },
                }));
            }

            SectionKind::Rodata => {
                let buf = fill_rodata(&mut rng, size);
                image[offset..offset + size].copy_from_slice(&buf[..size]);
                actual_sections.push(json!({
                    "offset": offset,
                    "size": size,
                    "type": "rodata",
                    "isa_family": Value::Null,
                    "details": { "source": "generated" },
                }));
            }

            SectionKind::Trailer => {
                // Computed after every other section is in place.
            }
        }
    }

    let trailer_kind = TrailerKind::from_name(layout.trailer_type).unwrap_or(TrailerKind::None);
    if trailer_kind != TrailerKind::None {
        let trailer_size = trailer_kind.size();
        let trailer_offset = total_size - trailer_size;
        let trailer_result = generate_trailer(trailer_kind, &image[..trailer_offset]);
        let len = trailer_result.data.len();
        image[trailer_offset..trailer_offset + len].copy_from_slice(&trailer_result.data);

        actual_sections.push(json!({
            "offset": trailer_offset,
            "size": len,
            "type": "trailer",
            "isa_family": Value::Null,
            "details": trailer_result.metadata,
        }));
    }

    let sha256 = {
        let mut hasher = sha2::Sha256::new();
        hasher.update(&image);
        to_hex(&hasher.finalize())
    };
    let md5 = to_hex(&md5::compute(&image).0);

    let isa_label = layout.isa_label();
    let sub_dir = firmware_dir.join(&isa_label);
    fs::create_dir_all(&sub_dir).context(CreateOutputDirSnafu { path: sub_dir.clone() })?;

    let bin_path = sub_dir.join(format!("{}.bin", layout.image_id));
    let json_path = sub_dir.join(format!("{}.json", layout.image_id));

    fs::write(&bin_path, &image).context(WriteImageSnafu { path: bin_path.clone() })?;

    let code_sections: Vec<&Value> =
        actual_sections.iter().filter(|s| s["type"] == "code").collect();
    let code_bytes: u64 = code_sections.iter().filter_map(|s| s["size"].as_u64()).sum();
    let num_sections = actual_sections.len();
    let is_multi_isa = layout.is_multi_isa();

    let metadata = json!({
        "image": {
            "id": layout.image_id,
            "path": format!("{isa_label}/{}.bin", layout.image_id),
            "size_bytes": layout.total_size,
            "sha256": sha256,
            "md5": md5,
        },
        "isa": {
            "primary": layout.primary_isa,
            "all": layout.all_isa_families,
            "is_multi_isa": is_multi_isa,
        },
        "structure": {
            "header_type": layout.header_type,
            "trailer_type": layout.trailer_type,
            "num_sections": num_sections,
            "num_code_sections": code_sections.len(),
            "code_bytes": code_bytes,
            "code_fraction": if layout.total_size > 0 {
                (code_bytes as f64 / layout.total_size as f64 * 1000.0).round() / 1000.0
            } else {
                0.0
            },
        },
        "sections": actual_sections,
        "generation": {
            "seed": layout.seed,
            "timestamp": now_utc_iso8601(),
        },
    });

    let rendered = serde_json::to_vec_pretty(&metadata).context(crate::error::SerializeMetadataSnafu)?;
    fs::write(&json_path, rendered).context(WriteMetadataSnafu { path: json_path.clone() })?;

    Ok(GenerationResult {
        image_id: layout.image_id.clone(),
        size_bytes: layout.total_size,
        primary_isa: layout.primary_isa.clone(),
        isa_label,
        is_multi_isa,
        num_sections,
        code_bytes,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").unwrap();
    }
    out
}

fn str_param(params: &Value, key: &str) -> String {
    params.get(key).and_then(Value::as_str).unwrap_or("").to_owned()
}

/// Reads the blob named by `(triple, config, program)` under `objects_dir/family`, falling back
/// to the alphabetically first available blob for the family if the exact one is missing.
fn read_blob(
    objects_dir: &Path,
    family: &str,
    triple: &str,
    config: &str,
    program: &str,
) -> (Vec<u8>, String, String, String) {
    let exact = objects_dir.join(family).join(triple).join(config).join(format!("{program}.bin"));
    if let Ok(data) = fs::read(&exact) {
        return (data, triple.to_owned(), program.to_owned(), config.to_owned());
    }

    let family_dir = objects_dir.join(family);
    let mut candidates = Vec::new();
    let mut stack = vec![family_dir.clone()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "bin") {
                candidates.push(path);
            }
        }
    }
    candidates.sort();

    for candidate in candidates {
        if let Ok(data) = fs::read(&candidate) {
            if data.is_empty() {
                continue;
            }
            let rel = candidate.strip_prefix(&family_dir).unwrap_or(&candidate);
            let parts: Vec<_> = rel.components().collect();
            if parts.len() >= 3 {
                let triple = parts[0].as_os_str().to_string_lossy().into_owned();
                let config = parts[1].as_os_str().to_string_lossy().into_owned();
                let program =
                    candidate.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
                return (data, triple, program, config);
            }
            return (data, triple.to_owned(), program.to_owned(), config.to_owned());
        }
    }

    (Vec::new(), triple.to_owned(), program.to_owned(), config.to_owned())
}

fn fill_with_strings(rng: &mut impl Rng, size: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(size + 64);
    while buf.len() < size {
        let s = STRING_POOL.choose(rng).unwrap();
        buf.extend_from_slice(s);
    }
    buf
}

fn fill_rodata(rng: &mut impl Rng, size: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(size + 128);
    while buf.len() < size {
        if rng.gen::<f64>() < 0.5 {
            let s = STRING_POOL.choose(rng).unwrap();
            buf.extend_from_slice(s);
        } else {
            let val: u32 = rng.gen();
            let repeats = rng.gen_range(4..=32);
            for _ in 0..repeats {
                buf.extend_from_slice(&val.to_le_bytes());
            }
        }
    }
    buf
}
