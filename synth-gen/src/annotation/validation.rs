//! Candidate annotation filtering.

use super::BoundingBox;
use crate::{common::*, config::AnnotationConfig};

/// Gate a candidate box: minimum pixel area, centers inside [0, 1], and
/// strictly positive normalized dimensions no larger than 1.
pub fn accept_bbox(bbox: &BoundingBox, config: &AnnotationConfig) -> bool {
    if bbox.area < config.min_bbox_area {
        debug!("bbox rejected: area {} < {}", bbox.area, config.min_bbox_area);
        return false;
    }

    let centered = (0.0..=1.0).contains(&bbox.x_center.raw())
        && (0.0..=1.0).contains(&bbox.y_center.raw());
    if !centered {
        debug!("bbox rejected: center out of bounds");
        return false;
    }

    let sized = bbox.width.raw() > 0.0
        && bbox.width.raw() <= 1.0
        && bbox.height.raw() > 0.0
        && bbox.height.raw() <= 1.0;
    if !sized {
        debug!("bbox rejected: dimensions out of bounds");
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox_with_area(px: u32) -> BoundingBox {
        BoundingBox::try_from_pixel_bounds([0, 0, px, px], (1920, 1080)).unwrap()
    }

    #[test]
    fn area_gate() {
        let config = AnnotationConfig::default();
        assert!(accept_bbox(&bbox_with_area(50), &config));
        // 9 x 9 = 81 pixels, below the default 100 minimum
        assert!(!accept_bbox(&bbox_with_area(9), &config));
    }

    #[test]
    fn bounds_gate() {
        let config = AnnotationConfig::default();
        let mut bbox = bbox_with_area(50);
        bbox.x_center = r64(1.2);
        assert!(!accept_bbox(&bbox, &config));

        let mut bbox = bbox_with_area(50);
        bbox.height = r64(0.0);
        assert!(!accept_bbox(&bbox, &config));
    }
}
