//! Batch processing across independent model directories.
//!
//! Each subdirectory of a models root becomes one self-contained generation
//! job with its own dataset tree. Jobs run on a bounded pool of worker
//! threads; every worker owns a complete backend instance, so no mutable
//! state is shared across jobs. A failing job is logged and counted without
//! touching its siblings.

use super::generator::DatasetGenerator;
use crate::{backend::RenderBackend, common::*, config::GenerationConfig};
use std::thread;

pub const DEFAULT_BATCH_WORKERS: usize = 4;

/// Immediate subdirectories of the models root, sorted; each becomes one
/// batch job.
pub fn discover_model_dirs(models_root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(models_root)
        .with_context(|| format!("failed to read models root '{}'", models_root.display()))?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

pub struct BatchProcessor<F> {
    base_config: GenerationConfig,
    num_workers: usize,
    backend_factory: F,
}

impl<F, B> BatchProcessor<F>
where
    F: Fn() -> B + Send + Sync,
    B: RenderBackend,
{
    pub fn new(base_config: GenerationConfig, num_workers: usize, backend_factory: F) -> Self {
        let num_workers = num_workers.max(1);
        info!("batch processor initialized with {} workers", num_workers);
        Self {
            base_config,
            num_workers,
            backend_factory,
        }
    }

    /// Run one generation job for a single model directory.
    pub fn process_directory(&self, model_dir: &Path, output_dir: &Path) -> Result<()> {
        let mut config = self.base_config.clone();
        config.model_dir = model_dir.to_owned();
        config.output_dir = output_dir.to_owned();

        let generator = DatasetGenerator::new(config, (self.backend_factory)())?;
        let summary = generator.generate()?;

        info!(
            "completed processing {} ({}/{} images committed)",
            model_dir.display(),
            summary.total_committed(),
            summary.total_requested()
        );
        Ok(())
    }

    /// Process every model directory, at most `num_workers` jobs in flight.
    /// Returns the number of jobs that completed successfully.
    pub fn process_multiple(&self, model_dirs: &[PathBuf], output_base: &Path) -> usize {
        info!("processing {} directories", model_dirs.len());

        let (tx, rx) = flume::unbounded::<PathBuf>();
        for model_dir in model_dirs {
            if tx.send(model_dir.clone()).is_err() {
                break;
            }
        }
        drop(tx);

        let success_count: usize = thread::scope(|scope| {
            let workers: Vec<_> = (0..self.num_workers.min(model_dirs.len()))
                .map(|_| {
                    let rx = rx.clone();
                    scope.spawn(move || {
                        let mut successes = 0;
                        while let Ok(model_dir) = rx.recv() {
                            let name = model_dir
                                .file_name()
                                .map(|name| name.to_string_lossy().into_owned())
                                .unwrap_or_else(|| "dataset".to_owned());
                            let output_dir = output_base.join(name);

                            match self.process_directory(&model_dir, &output_dir) {
                                Ok(()) => successes += 1,
                                Err(err) => {
                                    error!(
                                        "failed to process {}: {:#}",
                                        model_dir.display(),
                                        err
                                    );
                                }
                            }
                        }
                        successes
                    })
                })
                .collect();

            workers
                .into_iter()
                .map(|worker| worker.join().unwrap_or(0))
                .sum()
        });

        info!(
            "batch processing complete: {}/{} succeeded",
            success_count,
            model_dirs.len()
        );
        success_count
    }
}
