//! Engine-free software backend.
//!
//! Stands in for a real 3D engine in tests and headless runs: loaded assets
//! become proxy cube geometry, physics settling is analytic (active bodies
//! come to rest on the ground plane), the camera is a pinhole with a 36mm
//! sensor, and rendering writes a flat background image. Model import
//! parsing and shading stay out of scope.

use super::{LightSpec, ObjectHandle, RenderBackend, RigidBodyKind};
use crate::{
    common::*,
    config::{ImageFileFormat, RenderConfig},
};
use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};

const SENSOR_WIDTH_MM: f64 = 36.0;

#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    resolution: (u32, u32),
    file_format: ImageFileFormat,
    quality: u8,
    background: [f64; 4],
    gravity: DVec3,
    lights: Vec<LightSpec>,
    objects: Vec<ProxyObject>,
    camera: Option<CameraPose>,
}

#[derive(Debug, Clone)]
struct ProxyObject {
    shape: ProxyShape,
    center: DVec3,
    body: Option<RigidBodyKind>,
    material: Material,
}

#[derive(Debug, Clone, Copy)]
enum ProxyShape {
    Plane { half: f64 },
    Cube { half: f64 },
}

#[derive(Debug, Clone, Copy)]
struct Material {
    base_color: [f64; 3],
    roughness: f64,
}

#[derive(Debug, Clone, Copy)]
struct CameraPose {
    location: DVec3,
    forward: DVec3,
    right: DVec3,
    up: DVec3,
    focal_length: f64,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            resolution: (1920, 1080),
            file_format: ImageFileFormat::Jpeg,
            quality: 95,
            background: [1.0, 1.0, 1.0, 1.0],
            gravity: DVec3::new(0.0, 0.0, -9.81),
            lights: vec![],
            objects: vec![],
            camera: None,
        }
    }

    pub fn lights(&self) -> &[LightSpec] {
        &self.lights
    }

    fn ground_level(&self) -> f64 {
        self.objects
            .iter()
            .filter_map(|obj| match obj.shape {
                ProxyShape::Plane { .. } => Some(obj.center.z),
                ProxyShape::Cube { .. } => None,
            })
            .fold(0.0, f64::min)
    }

    fn object(&self, handle: ObjectHandle) -> &ProxyObject {
        &self.objects[handle.0]
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for HeadlessBackend {
    fn reset_scene(&mut self) {
        self.objects.clear();
        self.lights.clear();
        self.background = [1.0, 1.0, 1.0, 1.0];
    }

    fn configure_physics(&mut self, gravity: DVec3, substeps: u32) {
        self.gravity = gravity;
        debug!("physics configured: gravity={:?}, substeps={}", gravity, substeps);
    }

    fn configure_render(&mut self, config: &RenderConfig) {
        // engine/samples/use_gpu have no headless counterpart
        self.resolution = config.resolution;
        self.file_format = config.file_format;
        self.quality = config.quality;
    }

    fn add_plane(&mut self, size: f64, location: DVec3) -> ObjectHandle {
        self.objects.push(ProxyObject {
            shape: ProxyShape::Plane { half: size / 2.0 },
            center: location,
            body: None,
            material: Material::default(),
        });
        ObjectHandle(self.objects.len() - 1)
    }

    fn add_light(&mut self, light: &LightSpec) {
        self.lights.push(light.clone());
    }

    fn set_background(&mut self, rgba: [f64; 4]) {
        self.background = rgba;
    }

    fn load_model(&mut self, path: &Path, scale: f64, location: DVec3) -> Option<ObjectHandle> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => {
                error!("file not found: {}", path.display());
                return None;
            }
        };
        if !metadata.is_file() || metadata.len() == 0 {
            error!("corrupt or empty asset: {}", path.display());
            return None;
        }

        self.objects.push(ProxyObject {
            shape: ProxyShape::Cube { half: scale / 2.0 },
            center: location,
            body: None,
            material: Material::default(),
        });
        Some(ObjectHandle(self.objects.len() - 1))
    }

    fn apply_rigid_body(
        &mut self,
        handle: ObjectHandle,
        kind: RigidBodyKind,
        mass: f64,
        friction: f64,
        restitution: f64,
    ) {
        debug!(
            "rigid body: kind={:?}, mass={}, friction={}, restitution={}",
            kind, mass, friction, restitution
        );
        self.objects[handle.0].body = Some(kind);
    }

    fn step_physics(&mut self, _start_frame: u32, _end_frame: u32) {
        if self.gravity.z >= 0.0 {
            return;
        }

        // quasi-static settle: active bodies come to rest on the ground
        let ground = self.ground_level();
        for obj in &mut self.objects {
            if obj.body != Some(RigidBodyKind::Active) {
                continue;
            }
            if let ProxyShape::Cube { half } = obj.shape {
                obj.center.z = ground + half;
            }
        }
    }

    fn set_camera_pose(&mut self, location: DVec3, look_at: DVec3, focal_length: f64) {
        let forward = (look_at - location).normalize_or_zero();
        let forward = if forward == DVec3::ZERO {
            -DVec3::Z
        } else {
            forward
        };
        let right = forward.cross(DVec3::Z).normalize_or_zero();
        let right = if right == DVec3::ZERO {
            DVec3::X
        } else {
            right
        };
        let up = right.cross(forward);

        self.camera = Some(CameraPose {
            location,
            forward,
            right,
            up,
            focal_length,
        });
    }

    fn project_world_to_camera(&self, point: DVec3) -> (f64, f64, f64) {
        let camera = match &self.camera {
            Some(camera) => camera,
            None => return (0.5, 0.5, -1.0),
        };

        let v = point - camera.location;
        let depth = v.dot(camera.forward);
        if depth <= f64::EPSILON {
            return (0.0, 0.0, depth);
        }

        let (width, height) = self.resolution;
        let aspect = width as f64 / height as f64;
        let focal = camera.focal_length / SENSOR_WIDTH_MM;
        let x = 0.5 + focal * v.dot(camera.right) / depth;
        let y = 0.5 + focal * aspect * v.dot(camera.up) / depth;
        (x, y, depth)
    }

    fn object_vertices(&self, handle: ObjectHandle) -> Vec<DVec3> {
        let obj = self.object(handle);
        match obj.shape {
            ProxyShape::Plane { half } => [(-half, -half), (-half, half), (half, -half), (half, half)]
                .iter()
                .map(|&(dx, dy)| obj.center + DVec3::new(dx, dy, 0.0))
                .collect(),
            ProxyShape::Cube { half } => (0..8)
                .map(|corner| {
                    let sign = |bit: usize| if corner >> bit & 1 == 0 { -half } else { half };
                    obj.center + DVec3::new(sign(0), sign(1), sign(2))
                })
                .collect(),
        }
    }

    fn jitter_material(&mut self, handle: ObjectHandle, color_shift: [f64; 3], roughness_shift: f64) {
        let material = &mut self.objects[handle.0].material;
        for (channel, shift) in material.base_color.iter_mut().zip(color_shift) {
            *channel = (*channel + shift).clamp(0.0, 1.0);
        }
        material.roughness = (material.roughness + roughness_shift).clamp(0.0, 1.0);
    }

    fn render(&mut self, path: &Path) -> Result<bool> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (width, height) = self.resolution;
        let pixel = Rgb([
            to_channel(self.background[0]),
            to_channel(self.background[1]),
            to_channel(self.background[2]),
        ]);
        let image = RgbImage::from_pixel(width, height, pixel);

        match self.file_format {
            ImageFileFormat::Jpeg => {
                let mut file = fs::File::create(path)?;
                JpegEncoder::new_with_quality(&mut file, self.quality).encode_image(&image)?;
            }
            ImageFileFormat::Png => {
                image.save_with_format(path, image::ImageFormat::Png)?;
            }
        }

        Ok(true)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8],
            roughness: 0.5,
        }
    }
}

fn to_channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reset_clears_scene_state() {
        use crate::backend::LightKind;

        let mut backend = HeadlessBackend::new();
        backend.add_plane(10.0, DVec3::ZERO);
        backend.add_light(&LightSpec {
            kind: LightKind::Point,
            energy: 1000.0,
            location: DVec3::new(0.0, 0.0, 3.0),
            color: [1.0, 1.0, 1.0],
        });
        backend.set_background([0.5, 0.5, 0.5, 1.0]);

        backend.reset_scene();
        assert!(backend.lights().is_empty());
        assert_eq!(backend.background, [1.0, 1.0, 1.0, 1.0]);
        assert!(backend.objects.is_empty());
    }

    #[test]
    fn missing_asset_yields_none() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.load_model(Path::new("/nonexistent/model.glb"), 1.0, DVec3::ZERO);
        assert!(handle.is_none());
    }

    #[test]
    fn empty_asset_yields_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.glb");
        fs::File::create(&path)?;

        let mut backend = HeadlessBackend::new();
        assert!(backend.load_model(&path, 1.0, DVec3::ZERO).is_none());
        Ok(())
    }

    #[test]
    fn active_bodies_settle_on_the_plane() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cube.glb");
        writeln!(fs::File::create(&path)?, "proxy")?;

        let mut backend = HeadlessBackend::new();
        backend.add_plane(10.0, DVec3::ZERO);
        let handle = backend
            .load_model(&path, 1.0, DVec3::new(0.5, -0.5, 2.0))
            .ok_or_else(|| format_err!("load failed"))?;
        backend.apply_rigid_body(handle, RigidBodyKind::Active, 1.0, 0.5, 0.3);
        backend.step_physics(1, 121);

        let center: DVec3 = backend
            .object_vertices(handle)
            .iter()
            .sum::<DVec3>()
            / 8.0;
        assert!((center.z - 0.5).abs() < 1e-9);
        assert!((center.x - 0.5).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn focus_point_projects_to_frame_center() {
        let mut backend = HeadlessBackend::new();
        backend.set_camera_pose(DVec3::new(2.0, 2.0, 2.0), DVec3::new(0.0, 0.0, 0.5), 50.0);

        let (x, y, depth) = backend.project_world_to_camera(DVec3::new(0.0, 0.0, 0.5));
        assert!(depth > 0.0);
        assert!((x - 0.5).abs() < 1e-9);
        assert!((y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn point_behind_camera_has_negative_depth() {
        let mut backend = HeadlessBackend::new();
        backend.set_camera_pose(DVec3::new(2.0, 0.0, 1.0), DVec3::ZERO, 50.0);

        let (_, _, depth) = backend.project_world_to_camera(DVec3::new(4.0, 0.0, 2.0));
        assert!(depth < 0.0);
    }
}
