//! ELF `.o` → raw binary extraction via an external `objcopy`-compatible tool.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use fwgen_isa::family::{EXCLUDED_TRIPLES, get_family_for_triple};
use snafu::IntoError;
use snafu::prelude::*;

use crate::error::{CreateOutputDirSnafu, Result, SpawnObjcopySnafu, TimeoutSnafu};

const DEFAULT_OBJCOPY: &str = "llvm-objcopy";
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a single blob extraction.
#[derive(Clone, Debug)]
pub struct ExtractionResult {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub success: bool,
    pub error: Option<String>,
    pub cached: bool,
    pub size_bytes: u64,
}

struct ExtractTask {
    elf_path: PathBuf,
    output_path: PathBuf,
}

/// Extracts raw machine code from ELF `.o` files using `llvm-objcopy` (or a compatible tool on
/// `$PATH`).
pub struct BlobExtractor {
    objcopy_path: PathBuf,
}

impl Default for BlobExtractor {
    fn default() -> Self {
        Self { objcopy_path: PathBuf::from(DEFAULT_OBJCOPY) }
    }
}

impl BlobExtractor {
    #[must_use]
    pub fn new(objcopy_path: impl Into<PathBuf>) -> Self {
        Self { objcopy_path: objcopy_path.into() }
    }

    /// Extracts a single `.o` file to a raw `.text`-only binary, honoring an mtime-based cache.
    ///
    /// # Errors
    /// Returns an error if the output directory cannot be created.
    pub fn extract(&self, elf_path: &Path, output_path: &Path, force: bool) -> Result<ExtractionResult> {
        if !force {
            if let Some(cached) = check_cache(elf_path, output_path) {
                return Ok(cached);
            }
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .context(CreateOutputDirSnafu { path: parent.to_path_buf() })?;
        }

        Ok(self.run_objcopy(elf_path, output_path))
    }

    fn run_objcopy(&self, elf_path: &Path, output_path: &Path) -> ExtractionResult {
        let spawned = Command::new(&self.objcopy_path)
            .arg("-O")
            .arg("binary")
            .arg("--only-section=.text")
            .arg(elf_path)
            .arg(output_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                return failed(
                    elf_path,
                    SpawnObjcopySnafu { path: elf_path.to_path_buf() }.into_error(source).to_string(),
                );
            }
        };

        let deadline = Instant::now() + EXTRACT_TIMEOUT;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Ok(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        break Err(TimeoutSnafu {
                            path: elf_path.to_path_buf(),
                            seconds: EXTRACT_TIMEOUT.as_secs(),
                        }
                        .build());
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(source) => {
                    break Err(SpawnObjcopySnafu { path: elf_path.to_path_buf() }.into_error(source))
                }
            }
        };

        let status = match status {
            Ok(status) => status,
            Err(error) => return failed(elf_path, error.to_string()),
        };

        if !status.success() {
            let stderr = child
                .stderr
                .take()
                .map(|mut s| {
                    use std::io::Read;
                    let mut buf = String::new();
                    let _ = s.read_to_string(&mut buf);
                    buf
                })
                .unwrap_or_default();
            return failed(elf_path, stderr.chars().take(200).collect());
        }

        match fs::metadata(output_path) {
            Ok(metadata) if metadata.len() > 0 => ExtractionResult {
                source: elf_path.to_path_buf(),
                output: Some(output_path.to_path_buf()),
                success: true,
                error: None,
                cached: false,
                size_bytes: metadata.len(),
            },
            _ => {
                let _ = fs::remove_file(output_path);
                failed(elf_path, "Empty .text section".to_owned())
            }
        }
    }

    /// Batch-extracts every `.o` file under `oracle_output_dir` into `objects_dir`, fanning work
    /// out across `jobs` worker threads. Returns `(total, success, cached)`.
    #[must_use]
    pub fn extract_all(
        &self,
        oracle_output_dir: &Path,
        objects_dir: &Path,
        jobs: usize,
        force: bool,
    ) -> (usize, usize, usize) {
        let tasks = discover_tasks(oracle_output_dir, objects_dir);
        if tasks.is_empty() {
            log::warn!("No .o files found in {}", oracle_output_dir.display());
            return (0, 0, 0);
        }

        let total = tasks.len();
        let queue = Mutex::new(tasks.into_iter().collect::<std::collections::VecDeque<_>>());
        let results = Mutex::new(Vec::with_capacity(total));

        log::info!("Extracting {total} objects with {jobs} workers...");

        std::thread::scope(|scope| {
            for _ in 0..jobs.max(1) {
                scope.spawn(|| loop {
                    let task = {
                        let mut guard = queue.lock().unwrap();
                        guard.pop_front()
                    };
                    let Some(task) = task else { break };
                    let result = self.extract(&task.elf_path, &task.output_path, force);
                    let outcome = match result {
                        Ok(outcome) => outcome,
                        Err(error) => failed(&task.elf_path, error.to_string()),
                    };
                    results.lock().unwrap().push(outcome);
                });
            }
        });

        let results = results.into_inner().unwrap();
        let success = results.iter().filter(|r| r.success).count();
        let cached = results.iter().filter(|r| r.cached).count();
        (total, success, cached)
    }
}

fn check_cache(elf_path: &Path, output_path: &Path) -> Option<ExtractionResult> {
    let elf_meta = fs::metadata(elf_path).ok()?;
    let out_meta = fs::metadata(output_path).ok()?;
    if out_meta.len() == 0 {
        return None;
    }
    let elf_mtime = elf_meta.modified().ok()?;
    let out_mtime = out_meta.modified().ok()?;
    if out_mtime < elf_mtime {
        return None;
    }
    Some(ExtractionResult {
        source: elf_path.to_path_buf(),
        output: Some(output_path.to_path_buf()),
        success: true,
        error: None,
        cached: true,
        size_bytes: out_meta.len(),
    })
}

fn failed(elf_path: &Path, error: String) -> ExtractionResult {
    ExtractionResult {
        source: elf_path.to_path_buf(),
        output: None,
        success: false,
        error: Some(error),
        cached: false,
        size_bytes: 0,
    }
}

/// Walks `oracle_output_dir` for `{triple}/{config}/{prog}.o` files and maps each to its
/// `{objects_dir}/{family}/{triple}/{config}/{prog}.bin` destination.
fn discover_tasks(oracle_output_dir: &Path, objects_dir: &Path) -> Vec<ExtractTask> {
    let mut out = Vec::new();
    let mut stack = vec![oracle_output_dir.to_path_buf()];
    let mut found = Vec::new();

    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "o") {
                found.push(path);
            }
        }
    }
    found.sort();

    for o_file in found {
        let Ok(rel) = o_file.strip_prefix(oracle_output_dir) else { continue };
        let parts: Vec<_> = rel.components().collect();
        if parts.len() < 3 {
            continue;
        }
        let triple = parts[0].as_os_str().to_string_lossy().into_owned();
        if EXCLUDED_TRIPLES.contains(&triple.as_str()) {
            continue;
        }
        let Some(family) = get_family_for_triple(&triple) else { continue };

        let mut out_path = objects_dir.join(family).join(rel);
        out_path.set_extension("bin");
        out.push(ExtractTask { elf_path: o_file, output_path: out_path });
    }
    out
}
