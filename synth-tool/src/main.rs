use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::{info, warn};
use prettytable::{cell, row, Table};
use std::path::PathBuf;
use synth_gen::{
    backend::HeadlessBackend,
    config::GenerationConfig,
    pipeline::{
        discover_model_dirs, BatchProcessor, DatasetGenerator, GenerationSummary,
        DEFAULT_BATCH_WORKERS,
    },
    validate::{validate_dataset, visualize_annotations},
};

#[derive(Debug, Clone, Parser)]
/// Synthetic detection-dataset toolkit
enum Opts {
    /// Generate a labeled synthetic dataset from a model directory
    Generate {
        /// directory containing 3D models (.glb files)
        #[clap(long)]
        models: PathBuf,
        /// output directory for the generated dataset
        #[clap(long)]
        output: PathBuf,
        /// configuration YAML file
        #[clap(long)]
        config: Option<PathBuf>,
        /// total number of images to generate
        #[clap(long)]
        num_images: Option<usize>,
        /// image resolution
        #[clap(long, number_of_values = 2, value_names = &["WIDTH", "HEIGHT"])]
        resolution: Option<Vec<u32>>,
        /// number of parallel workers
        #[clap(long, default_value_t = 1)]
        workers: usize,
        /// random seed for reproducibility
        #[clap(long)]
        seed: Option<u64>,
        /// enable verbose logging
        #[clap(long, short)]
        verbose: bool,
    },
    /// Batch process model subdirectories into independent datasets
    Batch {
        /// parent directory containing model subdirectories
        #[clap(long)]
        models: PathBuf,
        /// base output directory, one dataset tree per subdirectory
        #[clap(long)]
        output: PathBuf,
        /// configuration YAML file
        #[clap(long)]
        config: Option<PathBuf>,
        /// number of parallel worker jobs
        #[clap(long, default_value_t = DEFAULT_BATCH_WORKERS)]
        workers: usize,
        /// enable verbose logging
        #[clap(long, short)]
        verbose: bool,
    },
    /// Validate a generated dataset
    Validate {
        /// path to the dataset directory
        #[clap(long)]
        dataset: PathBuf,
        /// draw bounding-box overlays into <dataset>/visualizations
        #[clap(long)]
        visualize: bool,
        /// write the validation report to a JSON file
        #[clap(long)]
        report: Option<PathBuf>,
        /// enable verbose logging
        #[clap(long, short)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    let verbose = match &opts {
        Opts::Generate { verbose, .. }
        | Opts::Batch { verbose, .. }
        | Opts::Validate { verbose, .. } => *verbose,
    };
    init_logger(verbose);

    match opts {
        Opts::Generate {
            models,
            output,
            config,
            num_images,
            resolution,
            workers,
            seed,
            ..
        } => generate(models, output, config, num_images, resolution, workers, seed),
        Opts::Batch {
            models,
            output,
            config,
            workers,
            ..
        } => batch(models, output, config, workers),
        Opts::Validate {
            dataset,
            visualize,
            report,
            ..
        } => validate(dataset, visualize, report),
    }
}

fn init_logger(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            let level = if verbose {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            };
            builder.filter_level(level);
        }
    }
    builder.init();
}

fn generate(
    models: PathBuf,
    output: PathBuf,
    config_file: Option<PathBuf>,
    num_images: Option<usize>,
    resolution: Option<Vec<u32>>,
    workers: usize,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = match &config_file {
        Some(path) => GenerationConfig::open(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => GenerationConfig::with_dirs(&models, &output),
    };

    // command-line arguments override the config file
    config.model_dir = models;
    config.output_dir = output.clone();
    if let Some(num_images) = num_images {
        config.num_images = num_images;
    }
    if let Some(resolution) = resolution {
        config.render.resolution = (resolution[0], resolution[1]);
    }
    if let Some(seed) = seed {
        config.random_seed = Some(seed);
    }
    config.validate()?;

    if workers > 1 {
        warn!(
            "image generation runs sequentially on a single scene; --workers {} ignored",
            workers
        );
    }

    let generator = DatasetGenerator::new(config, HeadlessBackend::new())?;
    let summary = generator.generate()?;
    print_summary(&summary);

    info!("dataset generated successfully in {}", output.display());
    Ok(())
}

fn batch(
    models: PathBuf,
    output: PathBuf,
    config_file: Option<PathBuf>,
    workers: usize,
) -> Result<()> {
    let base_config = match &config_file {
        Some(path) => GenerationConfig::open(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => GenerationConfig::with_dirs(&models, &output),
    };

    let model_dirs = discover_model_dirs(&models)?;
    ensure!(
        !model_dirs.is_empty(),
        "no model subdirectories found in '{}'",
        models.display()
    );

    let processor = BatchProcessor::new(base_config, workers, HeadlessBackend::new);
    let successes = processor.process_multiple(&model_dirs, &output);
    ensure!(
        successes > 0,
        "all {} batch jobs failed",
        model_dirs.len()
    );

    info!(
        "batch complete: {}/{} datasets generated in {}",
        successes,
        model_dirs.len(),
        output.display()
    );
    Ok(())
}

fn validate(dataset: PathBuf, visualize: bool, report_file: Option<PathBuf>) -> Result<()> {
    let report = validate_dataset(&dataset)?;

    // print split details
    {
        let mut table = Table::new();
        table.add_row(row!["split", "images", "labels"]);
        for split in &report.splits {
            table.add_row(row![split.split, split.num_images, split.num_labels]);
        }
        table.printstd();
    }

    println!("valid samples:   {}", report.summary.total_valid);
    println!("invalid samples: {}", report.summary.total_invalid);
    println!("success rate:    {:.2}%", report.summary.success_rate * 100.0);
    if !report.errors.is_empty() {
        println!("first errors:");
        for error in report.errors.iter().take(10) {
            println!("  - {}", error);
        }
    }

    if let Some(path) = report_file {
        report.save_json(&path)?;
        info!("report saved to {}", path.display());
    }

    if visualize {
        let written = visualize_annotations(&dataset)?;
        info!("wrote {} visualization images", written);
    }

    ensure!(
        report.is_clean(),
        "dataset validation found {} invalid samples",
        report.summary.total_invalid
    );
    Ok(())
}

fn print_summary(summary: &GenerationSummary) {
    let mut table = Table::new();
    table.add_row(row!["split", "requested", "committed"]);
    for split in &summary.splits {
        table.add_row(row![split.split, split.requested, split.committed]);
    }
    table.printstd();
}
