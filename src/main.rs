#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use env_logger::Builder;
use fwgen_assemble::pipeline::generate_all;
use fwgen_extract::{BlobExtractor, BlobIndex};
use fwgen_isa::FirmwareGenConfig;
use fwgen_layout::LayoutEngine;
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;

mod menu;
use menu::{Command, DryRunOptions, ExtractOptions, GenerateOptions, LayoutOptions};

fn color_level(level: Level) -> String {
    match level {
        Level::Error => level.red().to_string(),
        Level::Warn => level.yellow().to_string(),
        Level::Info => level.green().to_string(),
        Level::Debug => level.blue().to_string(),
        Level::Trace => level.purple().to_string(),
    }
}

const fn level_filter(verbose: usize) -> LevelFilter {
    match verbose {
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        //default to off
        _ => LevelFilter::Off,
    }
}

fn main() -> Result<()> {
    //Parse command line input
    let args: menu::FirmwareGen = argp::parse_args_or_exit(argp::DEFAULT);

    // Build up a logger with custom formatting and set it to the verbosity from the command line args
    if args.verbose != 0 {
        Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{}] {} {}",
                    fwgen_core::time::current_time(),
                    color_level(record.level()),
                    record.args()
                )
            })
            .filter(None, level_filter(args.verbose))
            .init();
    }

    match args.nested {
        Command::Generate(options) => run_generate(options)?,
        Command::Extract(options) => run_extract(options)?,
        Command::Layout(options) => run_layout(options)?,
        Command::DryRun(options) => run_dry_run(options)?,
    }
    Ok(())
}

fn families_option(families: Vec<String>) -> Option<Vec<String>> {
    (!families.is_empty()).then_some(families)
}

fn run_extract(options: ExtractOptions) -> Result<()> {
    let oracle_output = PathBuf::from(options.oracle_output);
    let objects_dir = PathBuf::from(options.objects_dir);

    let extractor = BlobExtractor::default();
    let (total, success, cached) =
        extractor.extract_all(&oracle_output, &objects_dir, options.jobs, options.force);

    log::info!("Extraction complete: {success}/{total} succeeded ({cached} cached)");
    Ok(())
}

fn run_generate(options: GenerateOptions) -> Result<()> {
    let config = FirmwareGenConfig {
        seed: options.seed,
        num_images: options.count as usize,
        min_size: options.min_size,
        max_size: options.max_size,
        multi_isa_probability: options.multi_isa_probability,
        parallel_jobs: options.jobs,
        oracle_output_dir: PathBuf::from(options.oracle_output),
        objects_dir: PathBuf::from(options.objects_dir),
        firmware_dir: PathBuf::from(options.firmware_dir),
        families: families_option(options.families),
        min_images_per_combo: options.images_per_combo,
        force_extract: false,
        verbose: false,
    };

    log::info!("Phase 1: Extracting blobs from {}", config.oracle_output_dir.display());
    let extractor = BlobExtractor::default();
    let (total, success, cached) = extractor.extract_all(
        &config.oracle_output_dir,
        &config.objects_dir,
        config.parallel_jobs,
        config.force_extract,
    );
    log::info!("Extracted {success}/{total} blobs ({cached} cached)");

    run_pipeline_from_index(&config)
}

fn run_layout(options: LayoutOptions) -> Result<()> {
    let config = FirmwareGenConfig {
        seed: options.seed,
        num_images: options.count as usize,
        min_size: options.min_size,
        max_size: options.max_size,
        multi_isa_probability: options.multi_isa_probability,
        parallel_jobs: options.jobs,
        objects_dir: PathBuf::from(options.objects_dir),
        firmware_dir: PathBuf::from(options.firmware_dir),
        families: families_option(options.families),
        min_images_per_combo: options.images_per_combo,
        ..Default::default()
    };

    run_pipeline_from_index(&config)
}

fn run_pipeline_from_index(config: &FirmwareGenConfig) -> Result<()> {
    log::info!("Phase 2: Indexing blobs in {}", config.objects_dir.display());
    let index = Arc::new(BlobIndex::new(&config.objects_dir));
    for (family, count) in index.summary() {
        log::info!("  {family:<15} {count:5}");
    }

    log::info!("Phase 3: Building layouts for {} images", config.num_images);
    let engine = LayoutEngine::new(Arc::clone(&index), config.clone())?;
    let layouts = engine.generate_batch(config.num_images as u64, config.seed);

    log::info!("Phase 4: Assembling {} images with {} workers", layouts.len(), config.parallel_jobs);
    std::fs::create_dir_all(&config.firmware_dir)?;
    let outcome = generate_all(&layouts, &config.objects_dir, &config.firmware_dir, config);
    outcome.manifest.save(&config.firmware_dir, config)?;

    log::info!("=== Generation Complete ===");
    log::info!("Time: {:.1}s", outcome.elapsed_ms as f64 / 1000.0);
    log::info!("Images: {} generated, {} failed", outcome.succeeded, outcome.failed);
    log::info!("Manifest: {}", config.firmware_dir.join("manifest.json").display());
    Ok(())
}

fn run_dry_run(options: DryRunOptions) -> Result<()> {
    let config = FirmwareGenConfig {
        seed: options.seed,
        num_images: options.count as usize,
        min_size: options.min_size,
        max_size: options.max_size,
        multi_isa_probability: options.multi_isa_probability,
        objects_dir: PathBuf::from(options.objects_dir),
        families: families_option(options.families),
        min_images_per_combo: options.images_per_combo,
        ..Default::default()
    };

    log::info!("Phase 2: Indexing blobs in {}", config.objects_dir.display());
    let index = Arc::new(BlobIndex::new(&config.objects_dir));
    for (family, count) in index.summary() {
        log::info!("  {family:<15} {count:5}");
    }

    log::info!("Phase 3: Building layouts for {} images (dry run)", config.num_images);
    let engine = LayoutEngine::new(Arc::clone(&index), config.clone())?;
    let layouts = engine.generate_batch(config.num_images as u64, config.seed);

    for layout in layouts.iter().take(5) {
        log::info!(
            "  {} | {} bytes | {} ({}) | {} sections, {} code | header={} trailer={}",
            layout.image_id,
            layout.total_size,
            layout.primary_isa,
            layout.isa_label(),
            layout.sections.len(),
            layout.code_sections().len(),
            layout.header_type,
            layout.trailer_type,
        );
    }
    if layouts.len() > 5 {
        log::info!("  ... and {} more", layouts.len() - 5);
    }

    let mut dir_counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for layout in &layouts {
        *dir_counts.entry(layout.isa_label()).or_insert(0) += 1;
    }
    log::info!("Directory distribution:");
    for (label, count) in dir_counts {
        log::info!("  {label:<20} {count:5}");
    }

    Ok(())
}
