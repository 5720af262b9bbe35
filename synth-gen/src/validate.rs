//! Generated-dataset validation and annotation visualization.

use crate::{
    annotation::{parse_label_file, LabelEntry},
    common::*,
    pipeline::Split,
    utils,
};
use image::{Rgb, RgbImage};

const MAX_REPORTED_ERRORS: usize = 100;
const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Validation results for one dataset tree, serializable as a JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub dataset_dir: PathBuf,
    pub splits: Vec<SplitReport>,
    pub summary: ValidationSummary,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub split: String,
    pub num_images: usize,
    pub num_labels: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub total_valid: usize,
    pub total_invalid: usize,
    pub error_count: usize,
    pub success_rate: f64,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.summary.total_invalid == 0 && self.errors.is_empty()
    }

    /// Write the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write report '{}'", path.display()))?;
        Ok(())
    }
}

/// Walk every split, check that each image has a parseable label file with
/// in-bounds annotations, and collect per-sample errors. Only the first
/// [`MAX_REPORTED_ERRORS`] error strings are retained.
pub fn validate_dataset(dataset_dir: &Path) -> Result<ValidationReport> {
    let mut valid_count = 0;
    let mut invalid_count = 0;
    let mut errors = vec![];
    let mut splits = vec![];

    for split in Split::ALL {
        let split_dir = dataset_dir.join(split.as_str());
        let images_dir = split_dir.join("images");
        let labels_dir = split_dir.join("labels");

        if !images_dir.exists() || !labels_dir.exists() {
            errors.push(format!("missing directories for {} split", split));
            continue;
        }

        let image_files = list_images(&images_dir)?;
        let label_files = utils::list_files(&labels_dir, "*.txt")?;
        splits.push(SplitReport {
            split: split.to_string(),
            num_images: image_files.len(),
            num_labels: label_files.len(),
        });

        for image_file in &image_files {
            let label_file = match label_path_for(&labels_dir, image_file) {
                Some(path) => path,
                None => continue,
            };

            if !label_file.exists() {
                errors.push(format!("missing label file: {}", label_file.display()));
                invalid_count += 1;
                continue;
            }

            match check_label_file(&label_file) {
                Ok(()) => valid_count += 1,
                Err(err) => {
                    errors.push(format!("{}: {:#}", label_file.display(), err));
                    invalid_count += 1;
                }
            }
        }
    }

    let total = valid_count + invalid_count;
    let success_rate = if total > 0 {
        valid_count as f64 / total as f64
    } else {
        0.0
    };

    info!(
        "validation complete: {} valid, {} invalid",
        valid_count, invalid_count
    );

    let error_count = errors.len();
    errors.truncate(MAX_REPORTED_ERRORS);
    Ok(ValidationReport {
        dataset_dir: dataset_dir.to_owned(),
        splits,
        summary: ValidationSummary {
            total_valid: valid_count,
            total_invalid: invalid_count,
            error_count,
            success_rate,
        },
        errors,
    })
}

/// Draw bounding-box outlines for every labeled image into
/// `<dataset>/visualizations/`. Returns the number of images written.
pub fn visualize_annotations(dataset_dir: &Path) -> Result<usize> {
    let vis_dir = dataset_dir.join("visualizations");
    utils::ensure_dir(&vis_dir)?;

    let mut written = 0;
    for split in Split::ALL {
        let split_dir = dataset_dir.join(split.as_str());
        let images_dir = split_dir.join("images");
        let labels_dir = split_dir.join("labels");
        if !images_dir.exists() {
            continue;
        }

        for image_file in list_images(&images_dir)? {
            let label_file = match label_path_for(&labels_dir, &image_file) {
                Some(path) if path.exists() => path,
                _ => continue,
            };
            let entries = match parse_label_file(&label_file) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("skipping {}: {:#}", label_file.display(), err);
                    continue;
                }
            };

            let mut image = image::open(&image_file)
                .with_context(|| format!("failed to open image '{}'", image_file.display()))?
                .into_rgb8();
            for entry in &entries {
                draw_outline(&mut image, entry);
            }

            let file_name = image_file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            image.save(vis_dir.join(file_name))?;
            written += 1;
        }
    }

    info!("wrote {} visualization images", written);
    Ok(written)
}

fn list_images(images_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = utils::list_files(images_dir, "*.jpg")?;
    files.extend(utils::list_files(images_dir, "*.png")?);
    files.sort();
    Ok(files)
}

fn label_path_for(labels_dir: &Path, image_file: &Path) -> Option<PathBuf> {
    let stem = image_file.file_stem()?;
    Some(labels_dir.join(format!("{}.txt", stem.to_string_lossy())))
}

fn check_label_file(path: &Path) -> Result<()> {
    let entries = parse_label_file(path)?;
    ensure!(!entries.is_empty(), "empty label file");

    for entry in &entries {
        let LabelEntry {
            x_center,
            y_center,
            width,
            height,
            ..
        } = entry;
        ensure!(
            (0.0..=1.0).contains(&x_center.raw()) && (0.0..=1.0).contains(&y_center.raw()),
            "center out of bounds"
        );
        ensure!(
            width.raw() > 0.0 && width.raw() <= 1.0 && height.raw() > 0.0 && height.raw() <= 1.0,
            "dimensions out of bounds"
        );
    }
    Ok(())
}

fn draw_outline(image: &mut RgbImage, entry: &LabelEntry) {
    let (width, height) = image.dimensions();
    let w = f64::from(width);
    let h = f64::from(height);

    let clamp_x = |value: f64| (value.round() as i64).clamp(0, i64::from(width) - 1) as u32;
    let clamp_y = |value: f64| (value.round() as i64).clamp(0, i64::from(height) - 1) as u32;

    let x_min = clamp_x((entry.x_center.raw() - entry.width.raw() / 2.0) * w);
    let x_max = clamp_x((entry.x_center.raw() + entry.width.raw() / 2.0) * w);
    let y_min = clamp_y((entry.y_center.raw() - entry.height.raw() / 2.0) * h);
    let y_max = clamp_y((entry.y_center.raw() + entry.height.raw() / 2.0) * h);

    for x in x_min..=x_max {
        image.put_pixel(x, y_min, OUTLINE_COLOR);
        image.put_pixel(x, y_max, OUTLINE_COLOR);
    }
    for y in y_min..=y_max {
        image.put_pixel(x_min, y, OUTLINE_COLOR);
        image.put_pixel(x_max, y, OUTLINE_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{write_label_file, BoundingBox};

    fn make_dataset(root: &Path) -> Result<()> {
        for split in Split::ALL {
            utils::ensure_dir(&root.join(split.as_str()).join("images"))?;
            utils::ensure_dir(&root.join(split.as_str()).join("labels"))?;
        }

        let image = RgbImage::from_pixel(64, 64, Rgb([200, 200, 200]));
        image.save(root.join("train/images/train_000000.jpg"))?;
        let bbox = BoundingBox::try_from_pixel_bounds([8, 8, 40, 40], (64, 64)).unwrap();
        write_label_file(&root.join("train/labels/train_000000.txt"), &[(0, bbox)])?;
        Ok(())
    }

    #[test]
    fn clean_dataset_validates() -> Result<()> {
        let dir = tempfile::tempdir()?;
        make_dataset(dir.path())?;

        let report = validate_dataset(dir.path())?;
        assert!(report.is_clean());
        assert_eq!(report.summary.total_valid, 1);
        assert_eq!(report.summary.total_invalid, 0);
        assert_eq!(report.summary.success_rate, 1.0);
        Ok(())
    }

    #[test]
    fn missing_label_is_reported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        make_dataset(dir.path())?;
        let image = RgbImage::from_pixel(64, 64, Rgb([200, 200, 200]));
        image.save(dir.path().join("train/images/train_000001.jpg"))?;

        let report = validate_dataset(dir.path())?;
        assert_eq!(report.summary.total_invalid, 1);
        assert!(!report.is_clean());
        Ok(())
    }

    #[test]
    fn out_of_bounds_annotation_is_reported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        make_dataset(dir.path())?;
        fs::write(
            dir.path().join("train/labels/train_000000.txt"),
            "0 1.500000 0.500000 0.100000 0.100000\n",
        )?;

        let report = validate_dataset(dir.path())?;
        assert_eq!(report.summary.total_invalid, 1);
        Ok(())
    }

    #[test]
    fn visualization_writes_overlays() -> Result<()> {
        let dir = tempfile::tempdir()?;
        make_dataset(dir.path())?;

        let written = visualize_annotations(dir.path())?;
        assert_eq!(written, 1);
        assert!(dir
            .path()
            .join("visualizations")
            .join("train_000000.jpg")
            .exists());
        Ok(())
    }
}
