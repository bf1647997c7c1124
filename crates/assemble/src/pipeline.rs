//! Fans a batch of layouts out across worker threads, rendering each to a firmware image.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use fwgen_isa::FirmwareGenConfig;
use fwgen_layout::ImageLayout;

use crate::manifest::FirmwareManifestBuilder;
use crate::worker::generate_single_image;

/// Outcome of rendering a whole batch: how many succeeded, how many failed, and the manifest
/// ready to be saved.
pub struct BatchOutcome {
    pub manifest: FirmwareManifestBuilder,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

/// Renders every layout in `layouts`, fanning work out across `config.parallel_jobs` worker
/// threads, logging progress every 50 images as images complete.
#[must_use]
pub fn generate_all(layouts: &[ImageLayout], objects_dir: &Path, firmware_dir: &Path, config: &FirmwareGenConfig) -> BatchOutcome {
    let start = Instant::now();
    let total = layouts.len();
    let queue = Mutex::new(layouts.iter().collect::<std::collections::VecDeque<_>>());
    let manifest = Mutex::new(FirmwareManifestBuilder::new());
    let completed = Mutex::new(0usize);

    log::info!("Generating {total} firmware images with {} workers", config.parallel_jobs.max(1));

    std::thread::scope(|scope| {
        for _ in 0..config.parallel_jobs.max(1) {
            scope.spawn(|| loop {
                let layout = {
                    let mut guard = queue.lock().unwrap();
                    guard.pop_front()
                };
                let Some(layout) = layout else { break };

                match generate_single_image(layout, objects_dir, firmware_dir) {
                    Ok(result) => {
                        log::debug!(
                            "Generated {}: {} bytes, {}, {} sections, {}ms",
                            result.image_id,
                            result.size_bytes,
                            result.primary_isa,
                            result.num_sections,
                            result.duration_ms,
                        );
                        manifest.lock().unwrap().add_result(result);
                    }
                    Err(error) => {
                        log::warn!("Worker error for {}: {error}", layout.image_id);
                        manifest.lock().unwrap().add_error(layout.image_id.clone());
                    }
                }

                let mut count = completed.lock().unwrap();
                *count += 1;
                if *count % 50 == 0 || *count == total {
                    let elapsed = start.elapsed().as_secs_f64();
                    let rate = if elapsed > 0.0 { *count as f64 / elapsed } else { 0.0 };
                    let eta = if rate > 0.0 { (total - *count) as f64 / rate } else { 0.0 };
                    log::info!(
                        "Progress: {}/{total} ({:.0}%) | {rate:.1} img/s | ETA: {eta:.0}s",
                        *count,
                        100.0 * *count as f64 / total.max(1) as f64,
                    );
                }
            });
        }
    });

    let manifest = manifest.into_inner().unwrap();
    let succeeded = manifest.success_count();
    let failed = manifest.error_count();

    BatchOutcome { manifest, succeeded, failed, elapsed_ms: start.elapsed().as_millis() as u64 }
}
