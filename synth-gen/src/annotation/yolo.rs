//! YOLO-format label files.
//!
//! One line per annotation: `<class_id> <x_center> <y_center> <width>
//! <height>`, six-decimal fixed-point normalized floats, space-separated.

use super::BoundingBox;
use crate::common::*;
use std::io::BufWriter;

/// One parsed label line.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEntry {
    pub class_id: usize,
    pub x_center: R64,
    pub y_center: R64,
    pub width: R64,
    pub height: R64,
}

/// Write an annotation list in input order, creating parent directories on
/// demand.
pub fn write_label_file(path: &Path, annotations: &[(usize, BoundingBox)]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(path)
        .with_context(|| format!("failed to create label file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    for (class_id, bbox) in annotations {
        writeln!(
            writer,
            "{} {:.6} {:.6} {:.6} {:.6}",
            class_id,
            bbox.x_center.raw(),
            bbox.y_center.raw(),
            bbox.width.raw(),
            bbox.height.raw()
        )?;
    }
    writer.flush()?;

    debug!("saved {} annotations to {}", annotations.len(), path.display());
    Ok(())
}

/// Parse a label file back into entries. Fails on malformed lines.
pub fn parse_label_file(path: &Path) -> Result<Vec<LabelEntry>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read label file '{}'", path.display()))?;

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<_> = line.split_whitespace().collect();
            ensure!(
                fields.len() == 5,
                "expected 5 fields per label line, got {}: '{}'",
                fields.len(),
                line
            );

            let class_id: usize = fields[0]
                .parse()
                .with_context(|| format!("invalid class id '{}'", fields[0]))?;
            let values: Vec<f64> = fields[1..]
                .iter()
                .map(|field| {
                    field
                        .parse()
                        .with_context(|| format!("non-numeric value '{}'", field))
                })
                .try_collect()?;

            Ok(LabelEntry {
                class_id,
                x_center: r64(values[0]),
                y_center: r64(values[1]),
                width: r64(values[2]),
                height: r64(values[3]),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bbox() -> BoundingBox {
        BoundingBox::try_from_pixel_bounds([100, 200, 400, 500], (1920, 1080)).unwrap()
    }

    #[test]
    fn round_trip_preserves_values() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("labels").join("train_000000.txt");

        let bbox = sample_bbox();
        write_label_file(&path, &[(2, bbox.clone()), (0, bbox.clone())])?;

        let entries = parse_label_file(&path)?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].class_id, 2);
        assert_eq!(entries[1].class_id, 0);
        for entry in &entries {
            assert!((entry.x_center.raw() - bbox.x_center.raw()).abs() < 1e-6);
            assert!((entry.y_center.raw() - bbox.y_center.raw()).abs() < 1e-6);
            assert!((entry.width.raw() - bbox.width.raw()).abs() < 1e-6);
            assert!((entry.height.raw() - bbox.height.raw()).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn line_format_is_fixed_point() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("label.txt");
        write_label_file(&path, &[(1, sample_bbox())])?;

        let text = fs::read_to_string(&path)?;
        let line = text.lines().next().unwrap();
        assert_eq!(line.split(' ').count(), 5);
        assert!(line.starts_with("1 "));
        for field in line.split(' ').skip(1) {
            let (_, decimals) = field.split_once('.').unwrap();
            assert_eq!(decimals.len(), 6);
        }
        Ok(())
    }

    #[test]
    fn malformed_lines_are_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("label.txt");

        fs::write(&path, "0 0.5 0.5 0.1\n")?;
        assert!(parse_label_file(&path).is_err());

        fs::write(&path, "0 0.5 abc 0.1 0.1\n")?;
        assert!(parse_label_file(&path).is_err());
        Ok(())
    }
}
