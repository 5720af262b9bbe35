//! Bounding box calculation from projected 3D geometry.

use crate::{
    backend::{ObjectHandle, RenderBackend},
    common::*,
};

/// A 2D detection bounding box, carried in both pixel and normalized form.
///
/// Invariants: normalized coordinates lie in [0, 1], normalized
/// width/height are strictly positive, and `area` is the clamped pixel
/// width times height.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
    /// Center x, normalized to [0, 1].
    pub x_center: R64,
    /// Center y, normalized to [0, 1].
    pub y_center: R64,
    /// Width, normalized to (0, 1].
    pub width: R64,
    /// Height, normalized to (0, 1].
    pub height: R64,
    /// Area in pixels.
    pub area: u64,
}

impl BoundingBox {
    /// Build a box from pixel-space bounds already clamped to the image.
    pub fn try_from_pixel_bounds(
        [x_min, y_min, x_max, y_max]: [u32; 4],
        (width, height): (u32, u32),
    ) -> Result<Self> {
        ensure!(x_max > x_min && y_max > y_min, "box must have positive extent");
        ensure!(
            x_max <= width && y_max <= height,
            "box exceeds the {}x{} image",
            width,
            height
        );

        let px_width = u64::from(x_max - x_min);
        let px_height = u64::from(y_max - y_min);
        let w = f64::from(width);
        let h = f64::from(height);

        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
            x_center: r64((f64::from(x_min) + f64::from(x_max)) / 2.0 / w),
            y_center: r64((f64::from(y_min) + f64::from(y_max)) / 2.0 / h),
            width: r64(px_width as f64 / w),
            height: r64(px_height as f64 / h),
            area: px_width * px_height,
        })
    }
}

/// Projects object geometry into the camera view and reduces it to an
/// axis-aligned pixel box.
///
/// This is a coarse vertex-projection box, not an exact silhouette.
#[derive(Debug, Clone)]
pub struct BoxProjector {
    resolution: (u32, u32),
}

impl BoxProjector {
    pub fn new(resolution: (u32, u32)) -> Self {
        Self { resolution }
    }

    /// Compute the object's bounding box, or `None` when it is not visible:
    /// every vertex behind the camera, or the clamped box collapsed to zero
    /// area. Boxes straddling the image border are clamped, not discarded.
    pub fn project<B>(&self, backend: &B, handle: ObjectHandle) -> Option<BoundingBox>
    where
        B: RenderBackend,
    {
        let (width, height) = self.resolution;
        let w = f64::from(width);
        let h = f64::from(height);

        let mut bounds: Option<[i64; 4]> = None;
        for vertex in backend.object_vertices(handle) {
            let (x, y, depth) = backend.project_world_to_camera(vertex);
            if depth < 0.0 {
                continue;
            }

            // image origin is top-left, so the y axis flips
            let x_px = (x * w).round() as i64;
            let y_px = ((1.0 - y) * h).round() as i64;

            bounds = Some(match bounds {
                None => [x_px, y_px, x_px, y_px],
                Some([x_min, y_min, x_max, y_max]) => [
                    x_min.min(x_px),
                    y_min.min(y_px),
                    x_max.max(x_px),
                    y_max.max(y_px),
                ],
            });
        }

        let [x_min, y_min, x_max, y_max] = match bounds {
            Some(bounds) => bounds,
            None => {
                debug!("object not visible in camera");
                return None;
            }
        };

        let x_min = x_min.max(0);
        let y_min = y_min.max(0);
        let x_max = x_max.min(i64::from(width));
        let y_max = y_max.min(i64::from(height));
        if x_max <= x_min || y_max <= y_min {
            return None;
        }

        let bbox = BoundingBox::try_from_pixel_bounds(
            [x_min as u32, y_min as u32, x_max as u32, y_max as u32],
            self.resolution,
        );
        match bbox {
            Ok(bbox) => Some(bbox),
            // unreachable after the clamp, but never worth a panic
            Err(err) => {
                warn!("degenerate projected box: {:#}", err);
                None
            }
        }
    }
}
