//! Generates per-image section layouts: realistic section ordering, sizing, and alignment.

use std::collections::BTreeMap;
use std::sync::Arc;

use fwgen_extract::BlobIndex;
use fwgen_headers::{HeaderKind, TrailerKind};
use fwgen_isa::FirmwareGenConfig;
use fwgen_isa::family::{ISA_FAMILIES, MULTI_ISA_AFFINITY, get_family};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};

use crate::error::{NoBlobsAvailableSnafu, Result};
use crate::image::ImageLayout;
use crate::section::{SectionKind, SectionSpec};
use snafu::prelude::*;

const NON_CODE_WEIGHTS: &[(SectionKind, f64)] = &[
    (SectionKind::Padding, 40.0),
    (SectionKind::StringTable, 15.0),
    (SectionKind::Filesystem, 10.0),
    (SectionKind::Random, 20.0),
    (SectionKind::Rodata, 15.0),
];

fn weighted_choice<T: Copy>(rng: &mut impl Rng, options: &[(T, f64)]) -> T {
    let total: f64 = options.iter().map(|(_, w)| w).sum();
    let r: f64 = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (item, weight) in options {
        cumulative += weight;
        if r <= cumulative {
            return *item;
        }
    }
    options[options.len() - 1].0
}

fn align_up(value: u64, alignment: u32) -> u64 {
    let alignment = u64::from(alignment);
    if alignment <= 1 {
        return value;
    }
    (value + alignment - 1) & !(alignment - 1)
}

/// Builds firmware image layouts with realistic section arrangements.
pub struct LayoutEngine {
    blob_index: Arc<BlobIndex>,
    config: FirmwareGenConfig,
    family_weights: Vec<(String, f64)>,
}

impl LayoutEngine {
    /// # Errors
    /// Returns [`Error::NoBlobsAvailable`](crate::error::Error::NoBlobsAvailable) if the index has
    /// no blobs for any known ISA family.
    pub fn new(blob_index: Arc<BlobIndex>, config: FirmwareGenConfig) -> Result<Self> {
        let family_weights: Vec<(String, f64)> = blob_index
            .families()
            .into_iter()
            .filter(|family| ISA_FAMILIES.iter().any(|f| f.name == *family))
            .filter_map(|family| {
                let count = blob_index.blob_count(family);
                (count > 0).then(|| (family.to_owned(), count as f64))
            })
            .collect();

        ensure!(!family_weights.is_empty(), NoBlobsAvailableSnafu);

        Ok(Self { blob_index, config, family_weights })
    }

    fn pick_primary_isa(&self, rng: &mut impl Rng) -> String {
        weighted_choice(rng, &self.family_weights)
    }

    fn pick_secondary_isas(&self, primary: &str, rng: &mut impl Rng) -> Vec<String> {
        let affinity: &[(&str, f64)] =
            MULTI_ISA_AFFINITY.iter().find(|(name, _)| *name == primary).map_or(&[], |(_, a)| *a);

        let mut available: Vec<(String, f64)> = affinity
            .iter()
            .filter(|(fam, _)| self.blob_index.blob_count(fam) > 0)
            .map(|(fam, w)| ((*fam).to_owned(), *w))
            .collect();

        if available.is_empty() {
            available = self
                .family_weights
                .iter()
                .filter(|(fam, _)| fam != primary)
                .map(|(fam, _)| (fam.clone(), 1.0))
                .collect();
            if available.is_empty() {
                return Vec::new();
            }
        }

        let count = *[1usize, 1, 2].choose(rng).unwrap();
        let mut secondaries = Vec::new();
        let mut pool = available;
        for _ in 0..count.min(pool.len()) {
            let pick = weighted_choice(rng, &pool);
            pool.retain(|(f, _)| *f != pick);
            secondaries.push(pick);
            if pool.is_empty() {
                break;
            }
        }
        secondaries
    }

    fn pick_header_type(&self, family: &str, rng: &mut impl Rng) -> HeaderKind {
        match get_family(family) {
            Ok(info) if !info.header_types.is_empty() => *info.header_types.choose(rng).unwrap(),
            _ => HeaderKind::Bare,
        }
    }

    fn pick_trailer_type(&self, rng: &mut impl Rng) -> TrailerKind {
        let options: Vec<(TrailerKind, f64)> =
            TrailerKind::all().iter().map(|k| (*k, f64::from(k.weight()))).collect();
        weighted_choice(rng, &options)
    }

    fn pick_total_size(&self, rng: &mut impl Rng) -> u64 {
        let log_min = (self.config.min_size as f64).log2();
        let log_max = (self.config.max_size as f64).log2();
        // `gen_range` panics on an empty range; `min_size == max_size` is a legitimate
        // fixed-size configuration, so fall back to the single value like Python's
        // `random.uniform(a, a) == a` does.
        let log_size = if log_max > log_min { rng.gen_range(log_min..log_max) } else { log_min };
        let size = 2f64.powf(log_size) as u64;
        align_up(size, 256)
    }

    fn pick_non_code_section(&self, rng: &mut impl Rng, max_size: u64) -> (SectionKind, u64, Value) {
        let section_kind = weighted_choice(rng, NON_CODE_WEIGHTS);

        match section_kind {
            SectionKind::Padding => {
                let inner = 64u64.max(max_size / 10);
                let pad_max = 16u64.max(max_size.min(65536).min(inner));
                let size = rng.gen_range(16..=pad_max);
                let pattern = *[0xFFu8, 0x00, 0xAA, 0xDE].choose(rng).unwrap();
                (section_kind, size, json!({ "pattern": format!("0x{pattern:02X}"), "fill_byte": pattern }))
            }
            SectionKind::StringTable => {
                let hi = 64u64.max(4096.min(max_size));
                let size = rng.gen_range(64..=hi.max(64));
                (section_kind, size, json!({ "source": "generated" }))
            }
            SectionKind::Filesystem => {
                let hi = 512u64.max(65536.min(max_size));
                let size = rng.gen_range(512..=hi.max(512));
                let fs_type = *["squashfs", "jffs2", "cramfs", "romfs"].choose(rng).unwrap();
                (section_kind, size, json!({ "fs_type": fs_type }))
            }
            SectionKind::Random => {
                let hi = 32u64.max(8192.min(max_size));
                let size = rng.gen_range(32..=hi.max(32));
                (section_kind, size, json!({ "source": "random" }))
            }
            SectionKind::Rodata => {
                let hi = 64u64.max(16384.min(max_size));
                let size = rng.gen_range(64..=hi.max(64));
                (section_kind, size, json!({ "source": "generated" }))
            }
            _ => {
                let hi = 16u64.max(1024.min(max_size));
                let size = rng.gen_range(16..=hi.max(16));
                (section_kind, size, json!({}))
            }
        }
    }

    /// Generates a single firmware image layout.
    ///
    /// `primary_isa` forces the primary family (`None` picks one by blob-weighted random choice).
    /// `forced_secondaries` forces the exact secondary set: `None` rolls the multi-ISA dice,
    /// `Some(&[])` forces single-ISA, `Some(list)` uses exactly those families.
    pub fn generate_layout(
        &self,
        rng: &mut StdRng,
        seq: u64,
        primary_isa: Option<&str>,
        forced_secondaries: Option<&[String]>,
    ) -> ImageLayout {
        let primary_isa = primary_isa.map_or_else(|| self.pick_primary_isa(rng), str::to_owned);

        let mut all_families = vec![primary_isa.clone()];
        match forced_secondaries {
            Some(secondaries) => all_families.extend(secondaries.iter().cloned()),
            None => {
                if rng.gen::<f64>() < self.config.multi_isa_probability {
                    all_families.extend(self.pick_secondary_isas(&primary_isa, rng));
                }
            }
        }

        let header_kind = self.pick_header_type(&primary_isa, rng);
        let trailer_kind = self.pick_trailer_type(rng);
        let trailer_size = trailer_kind.size() as u64;

        let mut total_size = self.pick_total_size(rng);

        let mut sections = Vec::new();
        let mut cursor: u64 = 0;

        let header_size = header_kind.reserved_size() as u64;
        if header_size > 0 {
            sections.push(SectionSpec {
                offset: 0,
                size: header_size,
                kind: SectionKind::Header,
                alignment: 1,
                isa_family: None,
                fill_params: json!({ "header_type": header_kind.name() }),
            });
            cursor = header_size;
        }

        let mut usable_size = total_size.saturating_sub(cursor).saturating_sub(trailer_size);
        if usable_size < 64 {
            total_size = cursor + trailer_size + 256;
            usable_size = 256;
        }

        let code_fraction = rng.gen_range(0.30f64..0.70);
        let code_budget = (usable_size as f64 * code_fraction) as u64;
        let mut noncode_budget = usable_size - code_budget;
        let mut code_remaining = code_budget;

        let mut family_queue: Vec<String> = all_families.clone();

        while code_remaining >= 64 && !family_queue.is_empty() {
            let fam = family_queue[0].clone();
            family_queue.rotate_left(1);

            let alignment = get_family(&fam).map_or(4, |f| f.alignment);

            let Some(blob) = self.blob_index.get_random_blob(&fam, rng) else {
                family_queue.retain(|f| f != &fam);
                continue;
            };

            let blob_size = blob.size_bytes;
            let blob_triple = blob.triple.clone();
            let blob_program = blob.program.clone();
            let blob_config = blob.config.clone();

            let multiplier = *[1u64, 1, 1, 2, 3].choose(rng).unwrap();
            let mut section_size = (blob_size * multiplier).min(code_remaining);
            section_size = section_size.max(blob_size.min(code_remaining));
            section_size = align_up(section_size, alignment);
            if section_size > code_remaining {
                section_size = code_remaining;
            }
            if section_size < 4 {
                break;
            }

            let aligned_cursor = align_up(cursor, alignment);
            if aligned_cursor > cursor {
                let pad_size = aligned_cursor - cursor;
                sections.push(SectionSpec {
                    offset: cursor,
                    size: pad_size,
                    kind: SectionKind::Padding,
                    alignment: 1,
                    isa_family: None,
                    fill_params: json!({ "pattern": "0xFF", "fill_byte": 0xFF }),
                });
                cursor = aligned_cursor;
            }

            sections.push(SectionSpec {
                offset: cursor,
                size: section_size,
                kind: SectionKind::Code,
                alignment,
                isa_family: Some(fam.clone()),
                fill_params: json!({
                    "blob_family": fam,
                    "blob_triple": blob_triple,
                    "blob_program": blob_program,
                    "blob_config": blob_config,
                }),
            });
            cursor += section_size;
            code_remaining -= section_size;

            if rng.gen::<f64>() < 0.3 && noncode_budget >= 64 {
                let (nc_kind, nc_size, nc_params) = self.pick_non_code_section(rng, noncode_budget);
                let nc_size = nc_size.min(noncode_budget);
                sections.push(SectionSpec {
                    offset: cursor,
                    size: nc_size,
                    kind: nc_kind,
                    alignment: 1,
                    isa_family: None,
                    fill_params: nc_params,
                });
                cursor += nc_size;
                noncode_budget -= nc_size;
            }
        }

        while noncode_budget >= 32 && cursor < total_size.saturating_sub(trailer_size) {
            let (nc_kind, nc_size, nc_params) = self.pick_non_code_section(rng, noncode_budget);
            let nc_size = nc_size.min(noncode_budget).min(total_size.saturating_sub(trailer_size).saturating_sub(cursor));
            if nc_size < 16 {
                break;
            }
            sections.push(SectionSpec {
                offset: cursor,
                size: nc_size,
                kind: nc_kind,
                alignment: 1,
                isa_family: None,
                fill_params: nc_params,
            });
            cursor += nc_size;
            noncode_budget -= nc_size;
        }

        let gap = total_size.saturating_sub(trailer_size).saturating_sub(cursor);
        if gap > 0 {
            sections.push(SectionSpec {
                offset: cursor,
                size: gap,
                kind: SectionKind::Padding,
                alignment: 1,
                isa_family: None,
                fill_params: json!({ "pattern": "0xFF", "fill_byte": 0xFF }),
            });
            cursor += gap;
        }

        if trailer_size > 0 {
            sections.push(SectionSpec {
                offset: cursor,
                size: trailer_size,
                kind: SectionKind::Trailer,
                alignment: 1,
                isa_family: None,
                fill_params: json!({ "trailer_type": trailer_kind.name() }),
            });
        }

        ImageLayout {
            image_id: format!("fw_{}_{seq:06}", self.config.seed),
            total_size,
            primary_isa,
            header_type: header_kind.name(),
            trailer_type: trailer_kind.name(),
            sections,
            all_isa_families: all_families,
            seed: self.config.seed + seq,
        }
    }

    /// Generates a batch of layouts with per-family and per-combo minimums, then deterministically
    /// shuffles the result so families/combos interleave rather than clustering by generation
    /// order.
    pub fn generate_batch(&self, count: u64, master_seed: u64) -> Vec<ImageLayout> {
        let families: Vec<String> = self.family_weights.iter().map(|(f, _)| f.clone()).collect();
        let num_families = families.len() as u64;
        let min_per_combo = self.config.min_images_per_combo as u64;

        let base_per = (count / num_families).max(1);
        let mut quotas: BTreeMap<String, u64> = families.iter().map(|f| (f.clone(), base_per)).collect();
        let mut allocated = base_per * num_families;

        let remainder = count.saturating_sub(allocated);
        if remainder > 0 {
            let total_weight: f64 = self.family_weights.iter().map(|(_, w)| w).sum();
            for (fam, weight) in &self.family_weights {
                let extra = (remainder as f64 * weight / total_weight) as u64;
                *quotas.get_mut(fam).unwrap() += extra;
                allocated += extra;
            }
            let leftover = count.saturating_sub(allocated);
            let mut sorted_fams = self.family_weights.clone();
            sorted_fams.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
            for i in 0..leftover {
                let fam = &sorted_fams[(i as usize) % sorted_fams.len()].0;
                *quotas.get_mut(fam).unwrap() += 1;
            }
        }

        let mut layouts = Vec::new();
        let mut seq: u64 = 0;
        for fam in &families {
            for _ in 0..quotas[fam] {
                let mut rng = StdRng::seed_from_u64(master_seed + seq);
                layouts.push(self.generate_layout(&mut rng, seq, Some(fam), None));
                seq += 1;
            }
        }

        let mut combo_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut combo_primary: BTreeMap<String, String> = BTreeMap::new();
        for layout in &layouts {
            let label = layout.isa_label();
            *combo_counts.entry(label.clone()).or_insert(0) += 1;
            combo_primary.entry(label).or_insert_with(|| layout.primary_isa.clone());
        }

        let labels: Vec<String> = combo_counts.keys().cloned().collect();
        for label in labels {
            let needed = min_per_combo.saturating_sub(combo_counts[&label]);
            if needed == 0 {
                continue;
            }
            let primary = combo_primary[&label].clone();
            let secondaries: Vec<String> =
                label.split('+').filter(|f| *f != primary).map(str::to_owned).collect();
            for _ in 0..needed {
                let mut rng = StdRng::seed_from_u64(master_seed + seq);
                layouts.push(self.generate_layout(&mut rng, seq, Some(&primary), Some(&secondaries)));
                seq += 1;
            }
        }

        let mut shuffle_rng = StdRng::seed_from_u64(master_seed);
        layouts.shuffle(&mut shuffle_rng);

        layouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_boundary() {
        assert_eq!(align_up(10, 4), 12);
        assert_eq!(align_up(16, 4), 16);
        assert_eq!(align_up(5, 1), 5);
    }

    #[test]
    fn weighted_choice_is_deterministic() {
        let options = [("a", 1.0), ("b", 1.0), ("c", 1.0)];
        let mut rng_a = StdRng::seed_from_u64(1);
        let mut rng_b = StdRng::seed_from_u64(1);
        assert_eq!(weighted_choice(&mut rng_a, &options), weighted_choice(&mut rng_b, &options));
    }
}
